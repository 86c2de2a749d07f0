//! Conversation state and the per-turn state machine.
//!
//! Valid turn transitions:
//! - Idle -> UserSubmitted (user message appended)
//! - UserSubmitted -> AwaitingReply (reply scheduled)
//! - AwaitingReply -> Idle (bot message appended, or reply cancelled)
//!
//! `is_processing()` is true in every state except `Idle`, so no second
//! user message can be appended until the bot reply for the first lands.

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use yojana_core::types::{Message, MessageIdGenerator, Sender, SessionId};

use crate::error::ChatError;

/// Where the current turn is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Ready to accept a user message.
    Idle,
    /// User message appended, reply not yet scheduled.
    UserSubmitted,
    /// Reply scheduled and not yet produced.
    AwaitingReply,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::Idle => write!(f, "Idle"),
            TurnState::UserSubmitted => write!(f, "UserSubmitted"),
            TurnState::AwaitingReply => write!(f, "AwaitingReply"),
        }
    }
}

impl TurnState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &TurnState) -> bool {
        matches!(
            (self, target),
            (TurnState::Idle, TurnState::UserSubmitted)
                | (TurnState::UserSubmitted, TurnState::AwaitingReply)
                | (TurnState::AwaitingReply, TurnState::Idle)
        )
    }
}

// =============================================================================
// ConversationState
// =============================================================================

/// Everything one chat session owns: the message log, the flags, and the
/// text the user is composing.
#[derive(Debug, Clone)]
pub struct ConversationState {
    session_id: SessionId,
    messages: Vec<Message>,
    ids: MessageIdGenerator,
    turn: TurnState,
    muted: bool,
    listening: bool,
    input: String,
}

impl ConversationState {
    /// New session seeded with a bot greeting.
    pub fn new(greeting: &str) -> Self {
        let mut state = Self {
            session_id: SessionId::new(),
            messages: Vec::new(),
            ids: MessageIdGenerator::new(),
            turn: TurnState::Idle,
            muted: false,
            listening: false,
            input: String::new(),
        };
        state.push(greeting, Sender::Bot);
        state
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn is_processing(&self) -> bool {
        self.turn != TurnState::Idle
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Whether a send of the current input would be accepted.
    pub fn can_send(&self) -> bool {
        !self.input.trim().is_empty() && !self.is_processing()
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    // -----------------------------------------------------------------
    // Turn transitions
    // -----------------------------------------------------------------

    /// Append a user message. Rejects blank text and any in-flight turn.
    pub fn append_user(&mut self, text: &str) -> Result<&Message, ChatError> {
        if self.is_processing() {
            return Err(ChatError::ReplyInFlight);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.transition(TurnState::UserSubmitted)?;
        Ok(self.push(text, Sender::User))
    }

    /// Mark the reply as scheduled (`true`) or abandon it (`false`).
    pub fn set_processing(&mut self, processing: bool) -> Result<(), ChatError> {
        if processing {
            self.transition(TurnState::AwaitingReply)
        } else {
            if self.turn == TurnState::Idle {
                return Err(ChatError::NoReplyPending);
            }
            if self.turn == TurnState::UserSubmitted {
                // Reply was never scheduled; pass through to keep the table strict.
                self.transition(TurnState::AwaitingReply)?;
            }
            self.transition(TurnState::Idle)
        }
    }

    /// Append the bot reply and close the turn.
    pub fn append_bot(&mut self, text: &str) -> Result<&Message, ChatError> {
        if self.turn != TurnState::AwaitingReply {
            return Err(ChatError::NoReplyPending);
        }
        self.transition(TurnState::Idle)?;
        Ok(self.push(text, Sender::Bot))
    }

    /// Append a user message, clear the input buffer, and await a reply.
    pub fn begin_turn(&mut self, text: &str) -> Result<Message, ChatError> {
        let message = self.append_user(text)?.clone();
        self.clear_input();
        self.set_processing(true)?;
        Ok(message)
    }

    fn transition(&mut self, target: TurnState) -> Result<(), ChatError> {
        if !self.turn.can_transition_to(&target) {
            return Err(ChatError::InvalidTransition {
                from: self.turn,
                to: target,
            });
        }
        tracing::debug!(session_id = %self.session_id, "Turn state: {} -> {}", self.turn, target);
        self.turn = target;
        Ok(())
    }

    fn push(&mut self, text: &str, sender: Sender) -> &Message {
        let now = Utc::now();
        let id = self.ids.next_at(now);
        self.messages.push(Message::new(id, text, sender, now));
        &self.messages[self.messages.len() - 1]
    }
}

// =============================================================================
// Tests
// =============================================================================
