//! CLI argument definitions for the Yojana assistant.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use yojana_core::{language, AssistantConfig, Result};

/// Yojana: a terminal chat assistant for Indian government schemes.
#[derive(Parser, Debug)]
#[command(name = "yojana", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// UI and voice language id (english, hindi, gujarati, tamil, marathi, bengali).
    #[arg(short = 'L', long = "language")]
    pub language: Option<String>,

    /// Delay before the assistant replies, in milliseconds.
    #[arg(long = "reply-delay-ms")]
    pub reply_delay_ms: Option<u64>,

    /// Start with spoken replies muted.
    #[arg(long = "muted")]
    pub muted: bool,

    /// Disable speech input and output entirely.
    #[arg(long = "no-voice")]
    pub no_voice: bool,

    /// Print conversation events as JSON lines instead of chat text.
    #[arg(long = "json-events")]
    pub json_events: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long = "init-config")]
    pub init_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > YOJANA_CONFIG env var > platform default (~/.yojana/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("YOJANA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// Fails on an unknown `--language`.
    pub fn apply(&self, config: &mut AssistantConfig) -> Result<()> {
        if let Some(ref id) = self.language {
            config.language.default = language::lookup(id)?.id.to_string();
        }
        if let Some(ms) = self.reply_delay_ms {
            config.chat.reply_delay_ms = ms;
        }
        if self.muted {
            config.voice.start_muted = true;
        }
        if self.no_voice {
            config.voice.recognition_enabled = false;
            config.voice.synthesis_enabled = false;
        }
        Ok(())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".yojana").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".yojana").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use yojana_core::YojanaError;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("yojana").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_args() {
        let args = parse(&[]);
        assert!(args.config.is_none());
        assert!(args.language.is_none());
        assert!(!args.muted);
        assert!(!args.no_voice);
        assert!(!args.json_events);
        assert!(!args.init_config);
    }

    #[test]
    fn test_init_config_flag() {
        assert!(parse(&["--init-config"]).init_config);
    }

    #[test]
    fn test_config_flag_wins() {
        let args = parse(&["--config", "/tmp/yojana.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/yojana.toml"));
    }

    #[test]
    fn test_default_path_under_dot_yojana() {
        let path = default_config_path();
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_log_level_priority() {
        assert_eq!(parse(&[]).resolve_log_level("warn"), "warn");
        assert_eq!(parse(&["-l", "debug"]).resolve_log_level("warn"), "debug");
    }

    #[test]
    fn test_apply_overrides() {
        let args = parse(&[
            "--language",
            "Tamil",
            "--reply-delay-ms",
            "20",
            "--muted",
            "--no-voice",
        ]);
        let mut config = AssistantConfig::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.language.default, "tamil");
        assert_eq!(config.chat.reply_delay_ms, 20);
        assert!(config.voice.start_muted);
        assert!(!config.voice.recognition_enabled);
        assert!(!config.voice.synthesis_enabled);
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let mut config = AssistantConfig::default();
        config.chat.reply_delay_ms = 700;
        parse(&[]).apply(&mut config).unwrap();
        assert_eq!(config.chat.reply_delay_ms, 700);
        assert!(config.voice.synthesis_enabled);
        assert_eq!(config.language.default, "english");
    }

    #[test]
    fn test_apply_unknown_language() {
        let args = parse(&["--language", "klingon"]);
        let err = args.apply(&mut AssistantConfig::default()).unwrap_err();
        assert!(matches!(err, YojanaError::UnknownLanguage(_)));
    }

    #[test]
    fn test_invalid_delay_rejected_by_clap() {
        let result = CliArgs::try_parse_from(["yojana", "--reply-delay-ms", "soon"]);
        assert!(result.is_err());
    }
}
