//! In-memory article store.
//!
//! Mirrors the DynamoDB write semantics (per-language sub-fields,
//! fill-if-absent video fields, completed status never downgraded) for local
//! runs and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use vsum_models::{ArticleRecord, ArticleStatus, Language, LanguageFields, VideoFields};

use crate::error::{StoreError, StoreResult};
use crate::store::MetadataStore;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, ArticleRecord>,
    writes: usize,
    fail_with: Option<String>,
}

/// In-memory [`MetadataStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().fail_with = Some(message.into());
    }

    /// Insert a record as-is.
    pub fn seed(&self, record: ArticleRecord) {
        self.lock().records.insert(record.video_id.clone(), record);
    }

    /// Number of successful write calls.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(inner: &Inner) -> StoreResult<()> {
        match &inner.fail_with {
            Some(message) => Err(StoreError::request_failed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn upsert_language(
        &self,
        video_id: &str,
        lang: Language,
        fields: &LanguageFields,
        video: &VideoFields,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check(&inner)?;

        let record = inner
            .records
            .entry(video_id.to_string())
            .or_insert_with(|| ArticleRecord::new(video_id));
        record.apply_video_fields_if_absent(video);
        record.apply_language(lang, fields);
        record.article_update_datetime = Some(ArticleRecord::now_timestamp());
        inner.writes += 1;
        Ok(())
    }

    async fn mark_failed(
        &self,
        video_id: &str,
        lang: Language,
        status: ArticleStatus,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check(&inner)?;

        let record = inner
            .records
            .entry(video_id.to_string())
            .or_insert_with(|| ArticleRecord::new(video_id));
        if !record.is_completed(lang) {
            record.status.insert(lang, status.as_str().to_string());
        }
        inner.writes += 1;
        Ok(())
    }

    async fn get(&self, video_id: &str) -> StoreResult<Option<ArticleRecord>> {
        let inner = self.lock();
        Self::check(&inner)?;
        Ok(inner.records.get(video_id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ArticleRecord>> {
        let inner = self.lock();
        Self::check(&inner)?;

        // Only records with an update time are in the recency index
        let mut records: Vec<ArticleRecord> = inner
            .records
            .values()
            .filter(|r| r.article_update_datetime.is_some())
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.article_update_datetime
                .cmp(&a.article_update_datetime)
                .then_with(|| a.video_id.cmp(&b.video_id))
        });
        records.truncate(limit);
        Ok(records)
    }

    async fn check_ready(&self) -> StoreResult<()> {
        Self::check(&self.lock())
    }
}
