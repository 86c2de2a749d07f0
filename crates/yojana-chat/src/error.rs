//! Error types for the conversation engine.

use yojana_core::error::YojanaError;

use crate::state::TurnState;

/// Errors from the conversation engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a reply is already in flight")]
    ReplyInFlight,
    #[error("no reply is pending")]
    NoReplyPending,
    #[error("invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnState, to: TurnState },
    #[error("voice unavailable: {0}")]
    VoiceUnavailable(String),
    #[error("voice error: {0}")]
    VoiceError(String),
    #[error("no suggested question at position {index} (have {len})")]
    SuggestionOutOfRange { index: usize, len: usize },
    #[error("conversation has been shut down")]
    Cancelled,
    #[error("reply task failed: {0}")]
    TaskFailed(String),
    #[error(transparent)]
    Core(#[from] YojanaError),
}
