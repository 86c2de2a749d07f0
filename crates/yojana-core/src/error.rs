use thiserror::Error;

/// Top-level error type shared by the Yojana crates.
///
/// Higher-level crates define their own error enums and implement
/// `From<YojanaError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum YojanaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Translation error: {0}")]
    Translation(String),
}

impl From<toml::de::Error> for YojanaError {
    fn from(err: toml::de::Error) -> Self {
        YojanaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for YojanaError {
    fn from(err: toml::ser::Error) -> Self {
        YojanaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for YojanaError {
    fn from(err: serde_json::Error) -> Self {
        YojanaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Yojana operations.
pub type Result<T> = std::result::Result<T, YojanaError>;
