//! Change notifications published by the conversation controller.
//!
//! The presentation layer subscribes and re-renders on each event.

use serde::Serialize;
use yojana_core::types::Message;

/// Default capacity of the broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A state change in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A user or bot message was appended.
    MessageAppended { message: Message },
    /// A reply started or stopped being in flight.
    ProcessingChanged { processing: bool },
    MuteChanged { muted: bool },
    ListeningChanged { listening: bool },
    /// The input buffer changed (e.g. mirrored from the speech transcript).
    InputChanged { text: String },
    /// An in-flight reply was dropped at shutdown.
    ReplyCancelled,
}

impl ChatEvent {
    /// Stable event name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::MessageAppended { .. } => "message_appended",
            ChatEvent::ProcessingChanged { .. } => "processing_changed",
            ChatEvent::MuteChanged { .. } => "mute_changed",
            ChatEvent::ListeningChanged { .. } => "listening_changed",
            ChatEvent::InputChanged { .. } => "input_changed",
            ChatEvent::ReplyCancelled => "reply_cancelled",
        }
    }
}
