//! Article language allow-list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a language code is outside the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language: {0}")]
pub struct LanguageError(pub String);

/// ISO-639-1 languages the system will summarize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pt,
    En,
    Es,
    It,
    Fr,
    De,
}

impl Language {
    /// Every supported language, in allow-list order.
    pub const ALL: [Language; 6] = [
        Language::Pt,
        Language::En,
        Language::Es,
        Language::It,
        Language::Fr,
        Language::De,
    ];

    /// Get the ISO-639-1 code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
            Language::Es => "es",
            Language::It => "it",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    /// Parse an ISO-639-1 code (case-insensitive, surrounding whitespace ignored).
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.as_str() == code)
    }

    /// Map a spelled-out language name as reported by caption providers
    /// (e.g. "English (auto-generated)") to a supported language.
    ///
    /// Only the first word is considered.
    pub fn from_provider_name(name: &str) -> Option<Self> {
        let first = name.split_whitespace().next()?.to_lowercase();
        match first.as_str() {
            "portuguese" => Some(Language::Pt),
            "english" => Some(Language::En),
            "spanish" => Some(Language::Es),
            "italian" => Some(Language::It),
            "french" => Some(Language::Fr),
            "german" => Some(Language::De),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| LanguageError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_accepts_allow_list_only() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.as_str()), Some(lang));
        }
        assert_eq!(Language::from_code(" EN "), Some(Language::En));
        assert_eq!(Language::from_code("ja"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn test_from_provider_name() {
        assert_eq!(Language::from_provider_name("Portuguese"), Some(Language::Pt));
        assert_eq!(
            Language::from_provider_name("English (auto-generated)"),
            Some(Language::En)
        );
        assert_eq!(Language::from_provider_name("german"), Some(Language::De));
        assert_eq!(Language::from_provider_name("Japanese"), None);
        assert_eq!(Language::from_provider_name("   "), None);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Fr).unwrap(), "\"fr\"");
        let lang: Language = serde_json::from_str("\"it\"").unwrap();
        assert_eq!(lang, Language::It);
        assert!(serde_json::from_str::<Language>("\"ru\"").is_err());
    }

    #[test]
    fn test_from_str_error() {
        let err = "xx".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported language: xx");
    }
}
