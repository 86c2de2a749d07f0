//! Translation of user-visible strings.
//!
//! Strings are looked up by their English text. A missing entry, or the
//! English locale itself, yields the key unchanged.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, YojanaError};
use crate::language::{self, Language};

const BUNDLED_TABLES: &str = include_str!("../assets/translations.toml");

/// Provides translated UI strings for the current language.
pub trait Translator: Send + Sync {
    /// Translate `key`, falling back to `key` itself when no entry exists.
    fn translate(&self, key: &str) -> String;

    /// The language strings are currently translated into.
    fn current_language(&self) -> &'static Language;
}

type Tables = HashMap<String, HashMap<String, String>>;

/// Translator backed by per-language key/value tables.
#[derive(Debug, Clone)]
pub struct DictionaryTranslator {
    tables: Tables,
    current: &'static Language,
}

impl Default for DictionaryTranslator {
    fn default() -> Self {
        Self {
            tables: Tables::new(),
            current: language::default_language(),
        }
    }
}

impl DictionaryTranslator {
    /// An empty translator: every lookup falls back to the key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translator loaded with the tables shipped in the crate.
    pub fn bundled() -> Result<Self> {
        let mut translator = Self::new();
        translator.merge_str(BUNDLED_TABLES)?;
        Ok(translator)
    }

    /// Merge tables from TOML source. Later entries override earlier ones.
    ///
    /// Top-level tables must be named after a registered language id.
    pub fn merge_str(&mut self, source: &str) -> Result<()> {
        let incoming: Tables = toml::from_str(source)?;
        for (lang_id, entries) in incoming {
            let lang = language::find(&lang_id).ok_or_else(|| {
                YojanaError::Translation(format!("table for unknown language '{}'", lang_id))
            })?;
            debug!(language = lang.id, entries = entries.len(), "Merging translations");
            self.tables.entry(lang.id.to_string()).or_default().extend(entries);
        }
        Ok(())
    }

    /// Merge tables from a TOML file.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        self.merge_str(&content)?;
        info!("Translations loaded from {}", path.display());
        Ok(())
    }

    /// Switch the current language.
    pub fn set_language(&mut self, id: &str) -> Result<&'static Language> {
        let lang = language::lookup(id)?;
        self.current = lang;
        Ok(lang)
    }

    /// Builder-style variant of [`set_language`](Self::set_language).
    pub fn with_language(mut self, id: &str) -> Result<Self> {
        self.set_language(id)?;
        Ok(self)
    }

    /// Number of entries known for a language.
    pub fn entry_count(&self, id: &str) -> usize {
        self.tables.get(id).map(HashMap::len).unwrap_or(0)
    }
}

impl Translator for DictionaryTranslator {
    fn translate(&self, key: &str) -> String {
        self.tables
            .get(self.current.id)
            .and_then(|table| table.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn current_language(&self) -> &'static Language {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_translator_falls_back_to_key() {
        let t = DictionaryTranslator::new();
        assert_eq!(t.translate("Send message"), "Send message");
        assert_eq!(t.current_language().id, "english");
    }

    #[test]
    fn test_bundled_hindi() {
        let t = DictionaryTranslator::bundled()
            .unwrap()
            .with_language("hindi")
            .unwrap();
        assert_eq!(t.translate("Language"), "भाषा");
        assert_eq!(t.translate("Send message"), "संदेश भेजें");
    }

    #[test]
    fn test_english_is_identity() {
        let t = DictionaryTranslator::bundled().unwrap();
        assert_eq!(t.translate("Language"), "Language");
    }

    #[test]
    fn test_missing_key_falls_back() {
        let t = DictionaryTranslator::bundled()
            .unwrap()
            .with_language("tamil")
            .unwrap();
        assert_eq!(t.translate("Send message"), "Send message");
        assert_eq!(t.translate(""), "");
    }

    #[test]
    fn test_every_language_has_bundled_entries() {
        let t = DictionaryTranslator::bundled().unwrap();
        for lang in language::LANGUAGES.iter().skip(1) {
            assert!(t.entry_count(lang.id) > 0, "no entries for {}", lang.id);
        }
    }

    #[test]
    fn test_set_unknown_language_keeps_current() {
        let mut t = DictionaryTranslator::bundled().unwrap();
        t.set_language("hindi").unwrap();
        assert!(t.set_language("klingon").is_err());
        assert_eq!(t.current_language().id, "hindi");
    }

    #[test]
    fn test_merge_overrides_existing_entry() {
        let mut t = DictionaryTranslator::bundled().unwrap();
        t.merge_str("[hindi]\n\"Language\" = \"बोली\"\n").unwrap();
        t.set_language("hindi").unwrap();
        assert_eq!(t.translate("Language"), "बोली");
        assert_eq!(t.translate("Send message"), "संदेश भेजें");
    }

    #[test]
    fn test_merge_rejects_unknown_language_table() {
        let mut t = DictionaryTranslator::new();
        let err = t.merge_str("[klingon]\n\"Language\" = \"x\"\n").unwrap_err();
        assert!(matches!(err, YojanaError::Translation(_)));
    }

    #[test]
    fn test_merge_rejects_invalid_toml() {
        let mut t = DictionaryTranslator::new();
        let err = t.merge_str("[hindi\n").unwrap_err();
        assert!(matches!(err, YojanaError::Config(_)));
    }

    #[test]
    fn test_merge_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("[bengali]\n\"Send message\" = \"বার্তা পাঠান\"\n".as_bytes())
            .unwrap();

        let mut t = DictionaryTranslator::new();
        t.merge_file(file.path()).unwrap();
        t.set_language("bengali").unwrap();
        assert_eq!(t.translate("Send message"), "বার্তা পাঠান");
    }

    #[test]
    fn test_merge_missing_file_is_io_error() {
        let mut t = DictionaryTranslator::new();
        let err = t.merge_file(Path::new("/nonexistent/translations.toml")).unwrap_err();
        assert!(matches!(err, YojanaError::Io(_)));
    }
}
