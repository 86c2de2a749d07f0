//! Speech output through an external synthesiser program.
//!
//! Each reply spawns the configured command (espeak-ng by default) with the
//! text and voice language substituted into its arguments. Starting a new
//! utterance or calling `stop` kills the previous child.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use yojana_chat::{ChatError, SpeechOutput};
use yojana_core::language;

/// Placeholder replaced by the reply text.
const TEXT: &str = "{text}";
/// Placeholder replaced by the BCP 47 code, e.g. `hi-IN`.
const LANG: &str = "{lang}";
/// Placeholder replaced by the primary subtag, e.g. `hi`.
const LANG_SHORT: &str = "{lang_short}";

pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    available: bool,
    language: Mutex<String>,
    child: Mutex<Option<Child>>,
}

impl CommandSpeaker {
    /// Build from `program arg...`. Returns `None` for an empty command.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        let available = on_path(program);
        if !available {
            tracing::warn!(program = %program, "Speech synthesiser not found on PATH");
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            available,
            language: Mutex::new(language::ENGLISH.code.to_string()),
            child: Mutex::new(None),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders filled in.
    fn render_args(&self, text: &str) -> Vec<String> {
        let code = self
            .language
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let short = code.split('-').next().unwrap_or(&code).to_ascii_lowercase();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(TEXT, text)
                    .replace(LANG_SHORT, &short)
                    .replace(LANG, &code)
            })
            .collect()
    }

    fn kill_current(child: &mut Option<Child>) {
        if let Some(mut running) = child.take() {
            if let Ok(None) = running.try_wait() {
                if let Err(e) = running.kill() {
                    tracing::debug!(error = %e, "Failed to kill synthesiser");
                }
            }
            // Reap so the child does not linger as a zombie.
            let _ = running.wait();
        }
    }
}

impl SpeechOutput for CommandSpeaker {
    fn is_supported(&self) -> bool {
        self.available
    }

    fn is_speaking(&self) -> bool {
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        match child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(_) => {
                *child = None;
                false
            }
            None => false,
        }
    }

    fn speak(&self, text: &str) -> Result<(), ChatError> {
        if !self.available {
            return Err(ChatError::VoiceUnavailable(format!(
                "{} is not installed",
                self.program
            )));
        }
        let args = self.render_args(text);
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        Self::kill_current(&mut child);

        let spawned = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ChatError::VoiceError(format!("{}: {}", self.program, e)))?;
        tracing::debug!(program = %self.program, pid = spawned.id(), "Speaking reply");
        *child = Some(spawned);
        Ok(())
    }

    fn stop(&self) {
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        Self::kill_current(&mut child);
    }

    fn set_language(&self, code: &str) {
        *self.language.lock().unwrap_or_else(|e| e.into_inner()) = code.to_string();
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        let child = self.child.get_mut().unwrap_or_else(|e| e.into_inner());
        Self::kill_current(child);
    }
}

/// Whether `program` resolves to a file, either directly or via `PATH`.
fn on_path(program: &str) -> bool {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}
