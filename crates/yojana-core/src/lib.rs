pub mod config;
pub mod error;
pub mod language;
pub mod translate;
pub mod types;

pub use config::AssistantConfig;
pub use error::{Result, YojanaError};
pub use language::Language;
pub use translate::{DictionaryTranslator, Translator};
pub use types::*;
