//! Response generation for user questions.
//!
//! Maps free text to one fixed reply via the ordered [`RuleTable`]. Total
//! over all inputs: anything unmatched, including blank input, gets the
//! fallback clarification reply.

use std::sync::LazyLock;

use serde::Serialize;
use yojana_core::config::RuleConfig;
use yojana_core::types::Topic;

use crate::rules::RuleTable;

static BUILTIN: LazyLock<ResponseGenerator> = LazyLock::new(ResponseGenerator::builtin);

/// Generate a reply with the built-in rule table.
pub fn generate(input: &str) -> String {
    BUILTIN.generate(input)
}

/// A generated reply and the topic it was chosen for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub topic: Topic,
    pub text: String,
}

/// Deterministic keyword-based responder.
#[derive(Debug, Clone, Default)]
pub struct ResponseGenerator {
    table: RuleTable,
}

impl ResponseGenerator {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn builtin() -> Self {
        Self::new(RuleTable::builtin())
    }

    /// Generator for configured rules (built-in table when `rules` is empty).
    pub fn from_config(rules: &[RuleConfig]) -> Self {
        Self::new(RuleTable::from_config(rules))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Reply text for `input`.
    pub fn generate(&self, input: &str) -> String {
        self.respond(input).text
    }

    /// Topic `input` resolves to; `Topic::General` when no rule matches.
    pub fn classify(&self, input: &str) -> Topic {
        self.table
            .first_match(input)
            .map(|rule| rule.topic())
            .unwrap_or(Topic::General)
    }

    /// Reply text together with the topic that produced it.
    pub fn respond(&self, input: &str) -> Reply {
        match self.table.first_match(input) {
            Some(rule) => Reply {
                topic: rule.topic(),
                text: rule.reply().to_string(),
            },
            None => Reply {
                topic: Topic::General,
                text: self.table.fallback().to_string(),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
