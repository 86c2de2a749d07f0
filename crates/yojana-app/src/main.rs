//! Yojana application binary - composition root.
//!
//! Ties the crates together into a terminal chat assistant:
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialise tracing (to stderr, so stdout carries only the chat)
//! 3. Load translation tables and select the language
//! 4. Build speech adapters from the voice settings
//! 5. Run the interactive loop until `/quit`, end of input, or Ctrl-C
//!
//! `--init-config` writes the effective configuration and exits instead.

mod cli;
mod render;
mod repl;
mod speech;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use yojana_chat::{
    BufferedSpeechInput, ConversationController, NoSpeechInput, NoSpeechOutput, SpeechInput,
    SpeechOutput,
};
use yojana_core::config::{LanguageConfig, VoiceConfig};
use yojana_core::{AssistantConfig, DictionaryTranslator, Translator};

use crate::cli::CliArgs;
use crate::repl::Repl;
use crate::speech::CommandSpeaker;

/// Speech adapters selected from the voice settings.
struct Voice {
    input: Arc<dyn SpeechInput>,
    /// Set when typed lines should feed the recogniser.
    buffer: Option<Arc<BufferedSpeechInput>>,
    output: Arc<dyn SpeechOutput>,
}

fn build_voice(voice: &VoiceConfig) -> Voice {
    let (input, buffer): (Arc<dyn SpeechInput>, _) = if voice.recognition_enabled {
        let buffer = Arc::new(BufferedSpeechInput::new());
        (buffer.clone(), Some(buffer))
    } else {
        tracing::info!("Speech input disabled");
        (Arc::new(NoSpeechInput), None)
    };

    let output: Arc<dyn SpeechOutput> = if !voice.synthesis_enabled {
        tracing::info!("Speech output disabled");
        Arc::new(NoSpeechOutput)
    } else {
        match CommandSpeaker::from_command(&voice.tts_command) {
            Some(speaker) => {
                tracing::info!(program = %speaker.program(), "Speech output via external synthesiser");
                Arc::new(speaker)
            }
            None => {
                tracing::info!("No synthesiser command configured");
                Arc::new(NoSpeechOutput)
            }
        }
    };

    Voice {
        input,
        buffer,
        output,
    }
}

/// Bundled tables, plus any configured overrides, set to the configured language.
fn build_translator(language: &LanguageConfig) -> DictionaryTranslator {
    let mut translator = match DictionaryTranslator::bundled() {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "Bundled translations unreadable, using English only");
            DictionaryTranslator::new()
        }
    };

    if let Some(ref path) = language.translations_path {
        if let Err(e) = translator.merge_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load extra translations");
        }
    }

    if let Err(e) = translator.set_language(&language.default) {
        tracing::warn!(error = %e, "Falling back to English");
    }
    translator
}

/// Load the config file, reporting problems once tracing is up.
fn load_config(path: &Path) -> (AssistantConfig, Option<yojana_core::YojanaError>) {
    match AssistantConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (AssistantConfig::default(), Some(e)),
    }
}

/// Write `config` to `path`, refusing to overwrite an existing file.
fn write_config(path: &Path, config: &AssistantConfig) -> yojana_core::Result<()> {
    if path.exists() {
        return Err(yojana_core::YojanaError::Config(format!(
            "{} already exists",
            path.display()
        )));
    }
    config.save(path)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = load_config(&config_file);
    args.apply(&mut config)?;

    if args.init_config {
        write_config(&config_file, &config)?;
        println!("Wrote {}", config_file.display());
        return Ok(());
    }

    // Tracing. Logs go to stderr; the chat transcript owns stdout.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting Yojana v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(_) if !config_file.exists() => {
            tracing::info!(path = %config_file.display(), "No config file, using defaults")
        }
        Some(e) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid config, using defaults")
        }
    }

    // Language.
    let translator = build_translator(&config.language);
    let language = translator.current_language();

    // Conversation.
    let voice = build_voice(&config.voice);
    let controller = ConversationController::new(&config.chat, voice.input, voice.output)
        .muted(config.voice.start_muted);
    controller.set_language(language);

    let mut repl = Repl::new(controller, translator, voice.buffer, std::io::stdout())
        .json_events(args.json_events);
    repl.banner()?;

    let lines = repl::spawn_stdin_reader();
    tokio::select! {
        result = repl.run(lines) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    repl.shutdown()?;
    tracing::info!("Goodbye");
    Ok(())
}
