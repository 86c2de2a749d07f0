//! Ordered keyword rules mapping questions to scheme replies.
//!
//! Rules are evaluated top to bottom against the lowercased input. The
//! first rule with any keyword contained in the input wins, so earlier
//! rules take priority when several keyword sets match.

use yojana_core::config::RuleConfig;
use yojana_core::types::Topic;

// =============================================================================
// Built-in replies
// =============================================================================

pub const PENSION_REPLY: &str = "The National Pension Scheme (NPS) is available for all citizens. To apply, you need to be between 18-60 years of age. You can contribute a minimum of ₹500 per month or ₹6,000 per year.";

pub const SCHOLARSHIP_REPLY: &str = "For education scholarships, check the National Scholarship Portal. Eligibility varies by scheme, but most require family income below ₹6 lakh per annum and good academic performance.";

pub const FARMER_REPLY: &str = "PM-KISAN provides income support of ₹6,000 per year to all landholding farmer families. Register through the local agriculture officer or the PM-KISAN portal with your land records and bank account details.";

pub const HEALTH_REPLY: &str = "Ayushman Bharat provides health coverage up to ₹5 lakh per family per year. It's available to poor and vulnerable families identified through the SECC database.";

pub const HOUSING_REPLY: &str = "Pradhan Mantri Awas Yojana (PMAY) offers affordable housing for the urban and rural poor. Under this scheme, eligible beneficiaries can receive financial assistance to build or purchase a house.";

pub const EMPLOYMENT_REPLY: &str = "The Mahatma Gandhi National Rural Employment Guarantee Act (MGNREGA) guarantees 100 days of wage employment in a financial year to rural households. Register with your local Gram Panchayat with your identity proof and address details.";

pub const FALLBACK_REPLY: &str = "Thank you for your question. To find specific government schemes, please provide details about your area of interest (like education, health, agriculture), your state, and your specific requirements. I can then suggest relevant schemes and eligibility criteria.";

// =============================================================================
// KeywordRule
// =============================================================================

/// A set of trigger substrings paired with a fixed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    topic: Topic,
    keywords: Vec<String>,
    reply: String,
}

impl KeywordRule {
    /// Create a rule. Keywords are lowercased; blank keywords are dropped.
    pub fn new<I, S>(topic: Topic, keywords: I, reply: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            topic,
            keywords,
            reply: reply.into(),
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Whether any keyword occurs in `lowered`, which must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

impl From<&RuleConfig> for KeywordRule {
    fn from(cfg: &RuleConfig) -> Self {
        KeywordRule::new(cfg.topic, &cfg.keywords, cfg.reply.clone())
    }
}

// =============================================================================
// RuleTable
// =============================================================================

/// Rules in priority order plus the reply used when none match.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<KeywordRule>,
    fallback: String,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTable {
    pub fn new(rules: Vec<KeywordRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// The welfare-scheme table.
    pub fn builtin() -> Self {
        Self::new(
            vec![
                KeywordRule::new(Topic::Pension, ["pension"], PENSION_REPLY),
                KeywordRule::new(
                    Topic::Scholarship,
                    ["education", "scholarship"],
                    SCHOLARSHIP_REPLY,
                ),
                KeywordRule::new(Topic::Farmer, ["farmer", "agriculture"], FARMER_REPLY),
                KeywordRule::new(
                    Topic::Health,
                    ["health", "insurance", "medical"],
                    HEALTH_REPLY,
                ),
                KeywordRule::new(Topic::Housing, ["housing", "home"], HOUSING_REPLY),
                KeywordRule::new(Topic::Employment, ["employment", "job"], EMPLOYMENT_REPLY),
            ],
            FALLBACK_REPLY,
        )
    }

    /// Table from configured rules; an empty list yields the built-in table.
    pub fn from_config(rules: &[RuleConfig]) -> Self {
        if rules.is_empty() {
            return Self::builtin();
        }
        Self::new(rules.iter().map(KeywordRule::from).collect(), FALLBACK_REPLY)
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// The highest-priority rule matching `input`, if any.
    pub fn first_match(&self, input: &str) -> Option<&KeywordRule> {
        let lowered = input.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }
}

// =============================================================================
// Tests
// =============================================================================
