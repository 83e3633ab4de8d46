//! Video identity and provider metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Identity of a summarization job: one video in one language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoKey {
    pub video_id: String,
    pub language: Language,
}

impl VideoKey {
    pub fn new(video_id: impl Into<String>, language: Language) -> Self {
        Self {
            video_id: video_id.into(),
            language,
        }
    }
}

impl fmt::Display for VideoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.video_id, self.language)
    }
}

/// A subtitle stream for a video in one language, addressable by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub url: String,
    pub language_code: String,
}

impl CaptionTrack {
    pub fn new(url: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language_code: language_code.into(),
        }
    }

    /// The track language, if it is on the allow-list.
    pub fn language(&self) -> Option<Language> {
        Language::from_code(&self.language_code)
    }
}

/// Normalized video metadata, identical for every metadata back-end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub title: String,
    pub length_seconds: u64,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_url: String,
    pub publish_date: String,
    pub category: String,
    pub view_count: u64,
    /// Caption tracks in provider order.
    pub captions: Vec<CaptionTrack>,
}

impl VideoMetadata {
    /// Drop caption tracks whose language is outside the allow-list and
    /// rewrite the kept codes to their canonical lower-case form.
    pub fn retain_allowed_captions(&mut self) {
        self.captions.retain_mut(|c| match c.language() {
            Some(lang) => {
                c.language_code = lang.as_str().to_string();
                true
            }
            None => false,
        });
    }

    /// First caption track whose language equals `lang`.
    pub fn caption_for(&self, lang: Language) -> Option<&CaptionTrack> {
        self.captions.iter().find(|c| c.language() == Some(lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_with(codes: &[&str]) -> VideoMetadata {
        VideoMetadata {
            title: "t".into(),
            captions: codes
                .iter()
                .map(|c| CaptionTrack::new(format!("https://captions/{c}"), *c))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_retain_allowed_captions_preserves_order() {
        let mut metadata = metadata_with(&["ja", "pt", "en-GB", "en", "de"]);
        metadata.retain_allowed_captions();
        let codes: Vec<_> = metadata
            .captions
            .iter()
            .map(|c| c.language_code.as_str())
            .collect();
        assert_eq!(codes, vec!["pt", "en", "de"]);
    }

    #[test]
    fn test_retain_allowed_captions_normalizes_codes() {
        let mut metadata = metadata_with(&["EN", " pt ", "JA"]);
        metadata.retain_allowed_captions();

        let codes: Vec<_> = metadata.captions.iter().map(|c| c.language_code.as_str()).collect();
        assert_eq!(codes, vec!["en", "pt"]);
        assert!(codes.iter().all(|c| Language::ALL.iter().any(|l| l.as_str() == *c)));
        assert_eq!(
            metadata.caption_for(Language::En).map(|c| c.url.as_str()),
            Some("https://captions/EN")
        );
    }

    #[test]
    fn test_caption_for_picks_first_match() {
        let mut metadata = metadata_with(&["en", "en"]);
        metadata.captions[1].url = "second".into();
        let track = metadata.caption_for(Language::En).unwrap();
        assert_eq!(track.url, "https://captions/en");
        assert!(metadata.caption_for(Language::Fr).is_none());
    }

    #[test]
    fn test_video_key_display_and_equality() {
        let a = VideoKey::new("dQw4w9WgXcQ", Language::En);
        let b = VideoKey::new("dQw4w9WgXcQ".to_string(), Language::En);
        assert_eq!(a, b);
        assert_ne!(a, VideoKey::new("dQw4w9WgXcQ", Language::Pt));
        assert_eq!(a.to_string(), "dQw4w9WgXcQ:en");
    }
}
