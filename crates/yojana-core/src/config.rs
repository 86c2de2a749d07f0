use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, YojanaError};
use crate::language;
use crate::types::Topic;

/// Greeting the conversation is seeded with.
pub const DEFAULT_GREETING: &str =
    "Hello! I'm your AI Assistant for government schemes. How can I help you today?";

/// Top-level configuration for the assistant.
///
/// Loaded from `~/.yojana/config.toml` by default. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub language: LanguageConfig,
}

impl AssistantConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AssistantConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        language::lookup(&self.language.default)?;
        for (i, rule) in self.chat.rules.iter().enumerate() {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(YojanaError::Config(format!(
                    "chat.rules[{}] ({}) has no keywords",
                    i, rule.topic
                )));
            }
            if rule.reply.trim().is_empty() {
                return Err(YojanaError::Config(format!(
                    "chat.rules[{}] ({}) has an empty reply",
                    i, rule.topic
                )));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Simulated latency between a user message and the bot reply.
    pub reply_delay_ms: u64,
    /// Bot message the conversation starts with.
    pub greeting: String,
    /// Replacement keyword rules, in priority order. Empty keeps the built-in table.
    pub rules: Vec<RuleConfig>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1500,
            greeting: DEFAULT_GREETING.to_string(),
            rules: Vec::new(),
        }
    }
}

/// One keyword rule as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub topic: Topic,
    pub keywords: Vec<String>,
    pub reply: String,
}

/// Voice input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Offer speech input (the `/mic` control).
    pub recognition_enabled: bool,
    /// Read bot replies aloud.
    pub synthesis_enabled: bool,
    /// Start with spoken replies muted.
    pub start_muted: bool,
    /// External synthesiser: program followed by arguments. `{text}`,
    /// `{lang}` (e.g. `hi-IN`) and `{lang_short}` (e.g. `hi`) are substituted.
    /// Empty disables spoken replies.
    pub tts_command: Vec<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            recognition_enabled: true,
            synthesis_enabled: true,
            start_muted: false,
            tts_command: vec![
                "espeak-ng".to_string(),
                "-v".to_string(),
                "{lang_short}".to_string(),
                "{text}".to_string(),
            ],
        }
    }
}

/// Language settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language id from the registry.
    pub default: String,
    /// Extra translation tables merged over the bundled ones.
    pub translations_path: Option<PathBuf>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: language::default_language().id.to_string(),
            translations_path: None,
        }
    }
}
