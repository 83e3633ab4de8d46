//! In-memory collaborators for orchestrator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vsum_dynamo::{MemoryMetadataStore, MetadataStore, StoreResult};
use vsum_models::{
    ArticleRecord, ArticleStatus, CaptionTrack, Language, LanguageFields, LifecycleStatus,
    VideoFields, VideoKey, VideoMetadata,
};
use vsum_pipeline::error::{FetchError, FetchResult, LlmError};
use vsum_pipeline::{
    CaptionSource, JobStateCoordinator, LlmClient, MetadataFetcher, MetadataSource, Orchestrator,
    RetryConfig, Summarizer,
};
use vsum_storage::MemoryBlobStore;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const TITLE: &str = "Never Gonna Give You Up";
pub const CAPTION: &str = "1\n00:00:18,000 --> 00:00:21,000\nWe're no strangers to love\n";
pub const SUMMARY_JSON: &str = r#"{"$content":"Hi","$lang":"en","$answer":"World"}"#;

pub fn metadata_with(codes: &[&str]) -> VideoMetadata {
    VideoMetadata {
        title: TITLE.to_string(),
        length_seconds: 212,
        channel_id: "UCuAXFkgsw1L7xaCfnd5JJOw".to_string(),
        channel_name: "Rick Astley".to_string(),
        channel_url: "https://www.youtube.com/@RickAstleyYT".to_string(),
        publish_date: "2009-10-24".to_string(),
        category: "Music".to_string(),
        view_count: 1_500_000_000,
        captions: codes
            .iter()
            .map(|c| CaptionTrack::new(format!("https://captions.test/{c}"), *c))
            .collect(),
    }
}

/// Ordered record of the job status each collaborator saw when called.
pub struct StatusLog {
    coordinator: Arc<JobStateCoordinator>,
    key: VideoKey,
    entries: Mutex<Vec<(&'static str, LifecycleStatus)>>,
}

impl StatusLog {
    fn record(&self, stage: &'static str) {
        if let Some(state) = self.coordinator.get(&self.key) {
            self.entries.lock().unwrap().push((stage, state.status));
        }
    }

    pub fn entries(&self) -> Vec<(&'static str, LifecycleStatus)> {
        self.entries.lock().unwrap().clone()
    }

    /// Whether the job metadata currently carries a title.
    pub fn title_visible(&self) -> bool {
        self.coordinator
            .get(&self.key)
            .is_some_and(|state| state.metadata.title.is_some())
    }
}

pub struct StaticMetadata {
    pub metadata: Option<VideoMetadata>,
    pub calls: AtomicU32,
    pub log: Arc<StatusLog>,
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, _video_id: &str) -> FetchResult<VideoMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.record("metadata");
        self.metadata
            .clone()
            .ok_or_else(|| FetchError::status(503, "upstream down"))
    }
}

pub struct StaticCaptions {
    pub text: Option<String>,
    pub log: Arc<StatusLog>,
    /// Whether the metadata stage's delta was visible at caption time.
    pub saw_title: Mutex<Option<bool>>,
}

#[async_trait]
impl CaptionSource for StaticCaptions {
    async fn fetch(&self, _track: &CaptionTrack) -> FetchResult<String> {
        self.log.record("caption");
        *self.saw_title.lock().unwrap() = Some(self.log.title_visible());
        self.text
            .clone()
            .ok_or_else(|| FetchError::status(404, "caption gone"))
    }
}

/// Replies with a fixed text and logs the job status seen while called.
pub struct ObservingLlm {
    pub reply: Result<String, LlmError>,
    pub delay: Duration,
    pub calls: AtomicU32,
    pub log: Arc<StatusLog>,
}

#[async_trait]
impl LlmClient for ObservingLlm {
    fn provider(&self) -> &'static str {
        "observing"
    }

    async fn complete(&self, _system: &str, _user: &str, _model: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.record("llm");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

/// Delegates to the in-memory store and logs the job status on each call.
pub struct ObservingStore {
    pub inner: MemoryMetadataStore,
    pub log: Arc<StatusLog>,
}

#[async_trait]
impl MetadataStore for ObservingStore {
    async fn upsert_language(
        &self,
        video_id: &str,
        lang: Language,
        fields: &LanguageFields,
        video: &VideoFields,
    ) -> StoreResult<()> {
        self.log.record("store.upsert");
        self.inner.upsert_language(video_id, lang, fields, video).await
    }

    async fn mark_failed(
        &self,
        video_id: &str,
        lang: Language,
        status: ArticleStatus,
    ) -> StoreResult<()> {
        self.log.record("store.mark_failed");
        self.inner.mark_failed(video_id, lang, status).await
    }

    async fn get(&self, video_id: &str) -> StoreResult<Option<ArticleRecord>> {
        self.log.record("store.get");
        self.inner.get(video_id).await
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ArticleRecord>> {
        self.inner.list_recent(limit).await
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub coordinator: Arc<JobStateCoordinator>,
    pub metadata: Arc<StaticMetadata>,
    pub llm: Arc<ObservingLlm>,
    pub captions: Arc<StaticCaptions>,
    pub log: Arc<StatusLog>,
    pub blob: MemoryBlobStore,
    pub store: MemoryMetadataStore,
}

pub struct HarnessBuilder {
    metadata: Option<VideoMetadata>,
    caption: Option<String>,
    reply: Result<String, LlmError>,
    delay: Duration,
    blob: MemoryBlobStore,
    store: MemoryMetadataStore,
    key: VideoKey,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            metadata: Some(metadata_with(&["en", "pt"])),
            caption: Some(CAPTION.to_string()),
            reply: Ok(SUMMARY_JSON.to_string()),
            delay: Duration::ZERO,
            blob: MemoryBlobStore::new(),
            store: MemoryMetadataStore::new(),
            key: VideoKey::new(VIDEO_ID, Language::En),
        }
    }

    pub fn metadata(mut self, metadata: Option<VideoMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn caption(mut self, caption: Option<&str>) -> Self {
        self.caption = caption.map(str::to_string);
        self
    }

    pub fn reply(mut self, reply: Result<String, LlmError>) -> Self {
        self.reply = reply;
        self
    }

    pub fn llm_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn blob(mut self, blob: MemoryBlobStore) -> Self {
        self.blob = blob;
        self
    }

    pub fn store(mut self, store: MemoryMetadataStore) -> Self {
        self.store = store;
        self
    }

    pub fn observe(mut self, key: VideoKey) -> Self {
        self.key = key;
        self
    }

    pub fn build(self) -> Harness {
        let coordinator = Arc::new(JobStateCoordinator::new(Duration::from_secs(20)));
        let log = Arc::new(StatusLog {
            coordinator: coordinator.clone(),
            key: self.key,
            entries: Mutex::new(Vec::new()),
        });
        let metadata = Arc::new(StaticMetadata {
            metadata: self.metadata,
            calls: AtomicU32::new(0),
            log: log.clone(),
        });
        let captions = Arc::new(StaticCaptions {
            text: self.caption,
            log: log.clone(),
            saw_title: Mutex::new(None),
        });
        let llm = Arc::new(ObservingLlm {
            reply: self.reply,
            delay: self.delay,
            calls: AtomicU32::new(0),
            log: log.clone(),
        });

        let fetcher = MetadataFetcher::new(metadata.clone()).with_retry(
            RetryConfig::new("metadata_fetch")
                .with_max_retries(1)
                .with_base_delay(Duration::from_millis(1)),
        );
        let orchestrator = Orchestrator::new(
            coordinator.clone(),
            fetcher,
            captions.clone(),
            Summarizer::new(llm.clone(), "test-model"),
            Arc::new(self.blob.clone()),
            Arc::new(ObservingStore {
                inner: self.store.clone(),
                log: log.clone(),
            }),
        );

        Harness {
            orchestrator,
            coordinator,
            metadata,
            llm,
            captions,
            log,
            blob: self.blob,
            store: self.store,
        }
    }
}

/// Let detached tasks (the caption blob write) run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
