//! Conversation engine for the government scheme assistant.
//!
//! Provides the keyword rule table and response generator, the per-session
//! conversation state machine, speech adapter traits, and the controller
//! that ties them together with a cancellable reply delay.

pub mod controller;
pub mod error;
pub mod events;
pub mod response;
pub mod rules;
pub mod state;
pub mod suggestions;
pub mod voice;

pub use controller::{ConversationController, PendingReply};
pub use error::ChatError;
pub use events::ChatEvent;
pub use response::{generate, Reply, ResponseGenerator};
pub use rules::{KeywordRule, RuleTable};
pub use state::{ConversationState, TurnState};
pub use suggestions::PREDEFINED_QUESTIONS;
pub use voice::{
    BufferedSpeechInput, NoSpeechInput, NoSpeechOutput, SpeechInput, SpeechOutput,
    VoiceCapabilities, VOICE_ADVISORY_KEY,
};
