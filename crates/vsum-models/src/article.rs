//! Persisted multilingual article record.
//!
//! One record exists per video. Descriptive fields that depend on the
//! article language live in per-language maps; everything else is
//! single-valued and written once.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::summary::SummaryBody;
use crate::video::VideoMetadata;

/// Timestamp layout of `article_update_datetime`, sortable as a string.
pub const ARTICLE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Terminal per-language status written to the durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleStatus {
    /// Article body, answer and path are present.
    Completed,
    /// No caption track exists for the language.
    CaptionUnavailable,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Completed => "completed",
            ArticleStatus::CaptionUnavailable => "caption-unavailable",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-language fields written by one summarization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFields {
    pub title: String,
    pub content: String,
    pub answer: String,
    pub path: String,
    pub status: ArticleStatus,
}

/// Video-level fields; only written when absent on the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFields {
    pub channel_id: String,
    pub channel_name: String,
    pub upload_date: String,
    pub category: String,
    pub duration: u64,
    pub view_count: u64,
}

impl From<&VideoMetadata> for VideoFields {
    fn from(metadata: &VideoMetadata) -> Self {
        Self {
            channel_id: metadata.channel_id.clone(),
            channel_name: metadata.channel_name.clone(),
            upload_date: metadata.publish_date.clone(),
            category: metadata.category.clone(),
            duration: metadata.length_seconds,
            view_count: metadata.view_count,
        }
    }
}

/// Durable per-video article document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub video_id: String,
    #[serde(default)]
    pub title: BTreeMap<Language, String>,
    #[serde(default)]
    pub content: BTreeMap<Language, String>,
    #[serde(default)]
    pub answer: BTreeMap<Language, String>,
    #[serde(default)]
    pub path: BTreeMap<Language, String>,
    /// Raw status markers; older records may carry values outside [`ArticleStatus`].
    #[serde(default)]
    pub status: BTreeMap<Language, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_update_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

impl ArticleRecord {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            ..Default::default()
        }
    }

    /// Current timestamp in the record's update-time layout.
    pub fn now_timestamp() -> String {
        Utc::now().format(ARTICLE_DATETIME_FORMAT).to_string()
    }

    /// Parse the stored update time, if present and well-formed.
    pub fn updated_at(&self) -> Option<NaiveDateTime> {
        self.article_update_datetime
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, ARTICLE_DATETIME_FORMAT).ok())
    }

    /// Set every per-language field for `lang`, leaving other languages alone.
    pub fn apply_language(&mut self, lang: Language, fields: &LanguageFields) {
        self.title.insert(lang, fields.title.clone());
        self.content.insert(lang, fields.content.clone());
        self.answer.insert(lang, fields.answer.clone());
        self.path.insert(lang, fields.path.clone());
        self.status.insert(lang, fields.status.as_str().to_string());
    }

    /// Fill video-level fields that are not yet set.
    pub fn apply_video_fields_if_absent(&mut self, fields: &VideoFields) {
        fn fill(slot: &mut Option<String>, value: &str) {
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        fill(&mut self.channel_id, &fields.channel_id);
        fill(&mut self.channel_name, &fields.channel_name);
        fill(&mut self.upload_date, &fields.upload_date);
        fill(&mut self.category, &fields.category);
        self.duration.get_or_insert(fields.duration);
        self.view_count.get_or_insert(fields.view_count);
    }

    pub fn status_of(&self, lang: Language) -> Option<&str> {
        self.status.get(&lang).map(String::as_str)
    }

    pub fn is_completed(&self, lang: Language) -> bool {
        self.status_of(lang) == Some(ArticleStatus::Completed.as_str())
    }

    /// Languages whose article is complete.
    pub fn completed_languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|l| self.is_completed(*l))
            .collect()
    }

    /// Summary body for a completed language.
    pub fn summary(&self, lang: Language) -> Option<SummaryBody> {
        if !self.is_completed(lang) {
            return None;
        }
        Some(SummaryBody::new(
            self.content.get(&lang)?.clone(),
            lang.as_str(),
            self.answer.get(&lang)?.clone(),
        ))
    }

    /// Every language with content also has title, answer, path and a
    /// completed status.
    pub fn is_consistent(&self) -> bool {
        self.content.keys().all(|lang| {
            self.title.contains_key(lang)
                && self.answer.contains_key(lang)
                && self.path.contains_key(lang)
                && self.is_completed(*lang)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> LanguageFields {
        LanguageFields {
            title: title.to_string(),
            content: format!("# {title}"),
            answer: "Because.".to_string(),
            path: crate::slugify(title),
            status: ArticleStatus::Completed,
        }
    }

    #[test]
    fn test_apply_language_keeps_other_languages() {
        let mut record = ArticleRecord::new("dQw4w9WgXcQ");
        record.apply_language(Language::En, &fields("Hello"));
        record.apply_language(Language::Pt, &fields("Ola"));
        record.apply_language(Language::En, &fields("Hello again"));

        assert_eq!(record.title[&Language::En], "Hello again");
        assert_eq!(record.title[&Language::Pt], "Ola");
        assert_eq!(record.completed_languages(), vec![Language::Pt, Language::En]);
        assert!(record.is_consistent());
    }

    #[test]
    fn test_video_fields_only_fill_absent() {
        let mut record = ArticleRecord::new("v");
        record.channel_name = Some("Original".into());
        record.apply_video_fields_if_absent(&VideoFields {
            channel_id: "UC1".into(),
            channel_name: "Other".into(),
            duration: 212,
            ..Default::default()
        });
        assert_eq!(record.channel_name.as_deref(), Some("Original"));
        assert_eq!(record.channel_id.as_deref(), Some("UC1"));
        assert_eq!(record.duration, Some(212));
    }

    #[test]
    fn test_summary_requires_completed_status() {
        let mut record = ArticleRecord::new("v");
        assert!(record.summary(Language::En).is_none());

        record.status.insert(Language::En, "caption-unavailable".into());
        assert!(record.summary(Language::En).is_none());

        record.apply_language(Language::En, &fields("Title"));
        let summary = record.summary(Language::En).unwrap();
        assert_eq!(summary.lang, "en");
        assert_eq!(summary.content, "# Title");
    }

    #[test]
    fn test_is_consistent_detects_missing_status() {
        let mut record = ArticleRecord::new("v");
        record.content.insert(Language::Fr, "body".into());
        record.title.insert(Language::Fr, "titre".into());
        record.answer.insert(Language::Fr, "oui".into());
        record.path.insert(Language::Fr, "titre".into());
        assert!(!record.is_consistent());
        record.status.insert(Language::Fr, "completed".into());
        assert!(record.is_consistent());
    }

    #[test]
    fn test_updated_at_parses_layout() {
        let mut record = ArticleRecord::new("v");
        record.article_update_datetime = Some("2025-03-01T10:20:30".into());
        let parsed = record.updated_at().unwrap();
        assert_eq!(parsed.format(ARTICLE_DATETIME_FORMAT).to_string(), "2025-03-01T10:20:30");
    }

    #[test]
    fn test_json_uses_language_keys() {
        let mut record = ArticleRecord::new("v");
        record.apply_language(Language::De, &fields("Hallo"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["title"]["de"], "Hallo");
        assert_eq!(json["status"]["de"], "completed");
        assert_eq!(json["videoId"], "v");
    }
}
