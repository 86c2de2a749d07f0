//! Registry of supported locales.
//!
//! Each locale carries the speech-synthesis code used when replies are
//! read aloud and a flag glyph for display.

use serde::Serialize;

use crate::error::{Result, YojanaError};

/// A supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// Stable identifier, e.g. `"hindi"`.
    pub id: &'static str,
    /// Name in the language's own script.
    pub name: &'static str,
    /// BCP 47 tag handed to speech recognition and synthesis.
    pub code: &'static str,
    pub flag: &'static str,
}

pub const ENGLISH: Language = Language {
    id: "english",
    name: "English",
    code: "en-IN",
    flag: "\u{1f1ec}\u{1f1e7}",
};

const INDIA_FLAG: &str = "\u{1f1ee}\u{1f1f3}";

/// All supported locales, in display order.
pub static LANGUAGES: &[Language] = &[
    ENGLISH,
    Language {
        id: "hindi",
        name: "\u{939}\u{93f}\u{928}\u{94d}\u{926}\u{940}",
        code: "hi-IN",
        flag: INDIA_FLAG,
    },
    Language {
        id: "gujarati",
        name: "\u{a97}\u{ac1}\u{a9c}\u{ab0}\u{abe}\u{aa4}\u{ac0}",
        code: "gu-IN",
        flag: INDIA_FLAG,
    },
    Language {
        id: "tamil",
        name: "\u{ba4}\u{bae}\u{bbf}\u{bb4}\u{bcd}",
        code: "ta-IN",
        flag: INDIA_FLAG,
    },
    Language {
        id: "marathi",
        name: "\u{92e}\u{930}\u{93e}\u{920}\u{940}",
        code: "mr-IN",
        flag: INDIA_FLAG,
    },
    Language {
        id: "bengali",
        name: "\u{9ac}\u{9be}\u{982}\u{9b2}\u{9be}",
        code: "bn-IN",
        flag: INDIA_FLAG,
    },
];

/// Look up a locale by id (case-insensitive).
pub fn find(id: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.id.eq_ignore_ascii_case(id.trim()))
}

/// Like [`find`], but unknown ids are an error.
pub fn lookup(id: &str) -> Result<&'static Language> {
    find(id).ok_or_else(|| YojanaError::UnknownLanguage(id.to_string()))
}

/// The locale used when nothing else is configured.
pub fn default_language() -> &'static Language {
    &LANGUAGES[0]
}
