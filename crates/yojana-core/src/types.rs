use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Typed, spoken, or picked from the suggested questions.
    User,
    /// Produced by the response generator.
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// Scheme topic a reply belongs to.
///
/// `General` is the fallback when no keyword rule matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Pension,
    Scholarship,
    Farmer,
    Health,
    Housing,
    Employment,
    General,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::Pension => "pension",
            Topic::Scholarship => "scholarship",
            Topic::Farmer => "farmer",
            Topic::Health => "health",
            Topic::Housing => "housing",
            Topic::Employment => "employment",
            Topic::General => "general",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Newtype Wrappers - Identifiers
// =============================================================================

/// Identifier of a chat session (one run of the assistant).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier: milliseconds since the Unix epoch at creation.
///
/// Unique within a session; see [`MessageIdGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out creation-time-derived ids that never repeat within a session.
///
/// Two messages created in the same millisecond get consecutive ids.
#[derive(Debug, Default, Clone)]
pub struct MessageIdGenerator {
    last: i64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for a message created at `at`.
    pub fn next_at(&mut self, at: DateTime<Utc>) -> MessageId {
        let candidate = at.timestamp_millis();
        let id = if candidate > self.last {
            candidate
        } else {
            self.last + 1
        };
        self.last = id;
        MessageId(id)
    }
}

// =============================================================================
// Message
// =============================================================================

/// A single chat message. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, text: impl Into<String>, sender: Sender, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp,
        }
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_from_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    /// Local wall-clock time as `HH:MM`.
    pub fn display_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
