//! Job lifecycle state for progress polling.
//!
//! These types describe the in-memory view of a summarization job that
//! status endpoints expose while the job is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::video::VideoKey;

/// Ordered progress marker of a summarization job.
///
/// Declaration order is lifecycle order; the derived `Ord` is what the
/// coordinator uses to reject backward transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStatus {
    #[default]
    Pending,
    ProcessingMetadata,
    MetadataProcessed,
    ProcessingDownload,
    DownloadProcessed,
    ProcessingSummarize,
    SummarizeProcessed,
}

impl LifecycleStatus {
    /// Every status in lifecycle order.
    pub const ALL: [LifecycleStatus; 7] = [
        LifecycleStatus::Pending,
        LifecycleStatus::ProcessingMetadata,
        LifecycleStatus::MetadataProcessed,
        LifecycleStatus::ProcessingDownload,
        LifecycleStatus::DownloadProcessed,
        LifecycleStatus::ProcessingSummarize,
        LifecycleStatus::SummarizeProcessed,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Pending => "pending",
            LifecycleStatus::ProcessingMetadata => "processing-metadata",
            LifecycleStatus::MetadataProcessed => "metadata-processed",
            LifecycleStatus::ProcessingDownload => "processing-download",
            LifecycleStatus::DownloadProcessed => "download-processed",
            LifecycleStatus::ProcessingSummarize => "processing-summarize",
            LifecycleStatus::SummarizeProcessed => "summarize-processed",
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Partial article view accumulated while a job runs.
///
/// Every field is optional; [`JobMetadata::merge`] copies only the fields
/// that are set on the delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl JobMetadata {
    /// Overwrite fields with every field that is set on `delta`.
    pub fn merge(&mut self, delta: JobMetadata) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.title, delta.title);
        take(&mut self.channel_id, delta.channel_id);
        take(&mut self.channel_name, delta.channel_name);
        take(&mut self.category, delta.category);
        take(&mut self.upload_date, delta.upload_date);
        take(&mut self.duration, delta.duration);
        take(&mut self.content, delta.content);
        take(&mut self.answer, delta.answer);
        take(&mut self.path, delta.path);
    }

    pub fn is_empty(&self) -> bool {
        *self == JobMetadata::default()
    }
}

/// Snapshot of one in-flight (or recently finished) job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    pub key: VideoKey,
    pub created_at: DateTime<Utc>,
    /// Absolute deadline; not extended by progress.
    pub expires_at: DateTime<Utc>,
    pub status: LifecycleStatus,
    pub metadata: JobMetadata,
}
