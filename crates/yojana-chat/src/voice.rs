//! Speech input/output seams for the conversation engine.
//!
//! The controller only talks to these traits. Platforms without a
//! recogniser or synthesiser plug in [`NoSpeechInput`] / [`NoSpeechOutput`]
//! and the conversation carries on text-only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::error::ChatError;

/// Translation key for the advisory shown when a voice feature is missing.
pub const VOICE_ADVISORY_KEY: &str = "Some voice features may not be available in your browser.";

/// Speech recognition adapter.
pub trait SpeechInput: Send + Sync {
    /// Whether recognition is available at all.
    fn is_supported(&self) -> bool;

    fn is_listening(&self) -> bool;

    /// Begin capturing speech. Idempotent while already listening.
    fn start_listening(&self) -> Result<(), ChatError>;

    /// Stop capturing. The transcript is left as-is. Idempotent.
    fn stop_listening(&self);

    /// Live transcript of what has been recognised so far.
    fn transcript(&self) -> String;

    fn clear_text(&self);

    /// Recognition locale (BCP 47), e.g. `"hi-IN"`.
    fn set_language(&self, _code: &str) {}
}

/// Speech synthesis adapter.
pub trait SpeechOutput: Send + Sync {
    /// Whether synthesis is available at all.
    fn is_supported(&self) -> bool;

    fn is_speaking(&self) -> bool;

    /// Read `text` aloud, interrupting anything already being spoken.
    fn speak(&self, text: &str) -> Result<(), ChatError>;

    /// Stop speaking immediately. Idempotent.
    fn stop(&self);

    /// Synthesis voice locale (BCP 47), e.g. `"ta-IN"`.
    fn set_language(&self, _code: &str) {}
}

/// Which voice features are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceCapabilities {
    pub recognition: bool,
    pub synthesis: bool,
}

impl VoiceCapabilities {
    pub fn probe(input: &dyn SpeechInput, output: &dyn SpeechOutput) -> Self {
        Self {
            recognition: input.is_supported(),
            synthesis: output.is_supported(),
        }
    }

    /// True when something is missing and the advisory should be shown.
    pub fn needs_advisory(&self) -> bool {
        !self.recognition || !self.synthesis
    }
}

// =============================================================================
// Unsupported adapters
// =============================================================================

/// Speech input for platforms without a recogniser.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeechInput;

impl SpeechInput for NoSpeechInput {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_listening(&self) -> bool {
        false
    }

    fn start_listening(&self) -> Result<(), ChatError> {
        Err(ChatError::VoiceUnavailable(
            "speech recognition is not supported".to_string(),
        ))
    }

    fn stop_listening(&self) {}

    fn transcript(&self) -> String {
        String::new()
    }

    fn clear_text(&self) {}
}

/// Speech output for platforms without a synthesiser.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeechOutput;

impl SpeechOutput for NoSpeechOutput {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str) -> Result<(), ChatError> {
        Err(ChatError::VoiceUnavailable(
            "speech synthesis is not supported".to_string(),
        ))
    }

    fn stop(&self) {}
}

// =============================================================================
// BufferedSpeechInput
// =============================================================================

/// Speech input fed by an external recogniser.
///
/// Whatever drives recognition (an STT engine callback, or a terminal
/// treating typed lines as speech) calls [`push_transcript`] while the
/// adapter is listening. Pushes while not listening are dropped.
///
/// [`push_transcript`]: BufferedSpeechInput::push_transcript
#[derive(Debug, Default)]
pub struct BufferedSpeechInput {
    listening: AtomicBool,
    transcript: Mutex<String>,
    language: Mutex<String>,
}

impl BufferedSpeechInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append recognised text. Returns whether it was accepted.
    pub fn push_transcript(&self, text: &str) -> bool {
        if !self.is_listening() {
            tracing::debug!("Dropping transcript pushed while not listening");
            return false;
        }
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        if !transcript.is_empty() {
            transcript.push(' ');
        }
        transcript.push_str(text);
        true
    }

    /// Locale most recently set through [`SpeechInput::set_language`].
    pub fn language(&self) -> String {
        self.language.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SpeechInput for BufferedSpeechInput {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn start_listening(&self) -> Result<(), ChatError> {
        if !self.listening.swap(true, Ordering::SeqCst) {
            tracing::debug!("Speech input listening");
        }
        Ok(())
    }

    fn stop_listening(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            tracing::debug!("Speech input stopped");
        }
    }

    fn transcript(&self) -> String {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn clear_text(&self) {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn set_language(&self, code: &str) {
        *self.language.lock().unwrap_or_else(|e| e.into_inner()) = code.to_string();
    }
}

// =============================================================================
// Tests
// =============================================================================
