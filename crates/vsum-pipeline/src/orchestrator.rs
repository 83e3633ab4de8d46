//! End-to-end summarization of one `(video_id, lang)` pair.
//!
//! Stages run in order and each one moves the job's [`LifecycleStatus`]
//! forward in the coordinator so status polls can follow progress:
//!
//! 1. Admission (or "already in flight")
//! 2. Cached-article shortcut
//! 3. Metadata
//! 4. Caption download and sanitization, with the blob write detached
//! 5. Summarization
//! 6. Durable upsert of the language's fields
//!
//! A failed run leaves the coordinator entry at the last status reached; it
//! expires on its own.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{warn, Instrument};
use vsum_dynamo::MetadataStore;
use vsum_models::{
    slugify, ArticleRecord, ArticleStatus, JobMetadata, Language, LanguageFields, LifecycleStatus,
    SummaryBody, VideoFields, VideoKey, VideoMetadata,
};
use vsum_storage::BlobStore;

use crate::caption::{sanitize, CaptionSource, HttpCaptionFetcher};
use crate::config::PipelineConfig;
use crate::coordinator::{Admission, JobStateCoordinator};
use crate::error::{PipelineError, PipelineResult};
use crate::llm::build_llm_client;
use crate::logging::JobLogger;
use crate::metadata::MetadataFetcher;
use crate::metrics::{record_blob_write_failure, record_run, record_stage};
use crate::summarizer::Summarizer;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Parsed summary for the requested language.
    pub summary: SummaryBody,
    /// Durable record after the run.
    pub record: ArticleRecord,
    /// The summary came from an already-completed record.
    pub cached: bool,
}

/// Runs summarization jobs against explicitly injected collaborators.
#[derive(Clone)]
pub struct Orchestrator {
    coordinator: Arc<JobStateCoordinator>,
    metadata: MetadataFetcher,
    captions: Arc<dyn CaptionSource>,
    summarizer: Summarizer,
    blob: Arc<dyn BlobStore>,
    store: Arc<dyn MetadataStore>,
}

impl Orchestrator {
    pub fn new(
        coordinator: Arc<JobStateCoordinator>,
        metadata: MetadataFetcher,
        captions: Arc<dyn CaptionSource>,
        summarizer: Summarizer,
        blob: Arc<dyn BlobStore>,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            coordinator,
            metadata,
            captions,
            summarizer,
            blob,
            store,
        }
    }

    /// Wire the HTTP collaborators described by `config` around the given
    /// stores.
    pub fn from_config(
        config: &PipelineConfig,
        blob: Arc<dyn BlobStore>,
        store: Arc<dyn MetadataStore>,
    ) -> PipelineResult<Self> {
        let coordinator = Arc::new(JobStateCoordinator::new(config.job_ttl));
        let metadata = MetadataFetcher::from_config(config)?;
        let captions = Arc::new(HttpCaptionFetcher::new(config.fetch_http_client()?));
        let summarizer = Summarizer::new(build_llm_client(config)?, config.llm_model());

        Ok(Self::new(coordinator, metadata, captions, summarizer, blob, store))
    }

    pub fn coordinator(&self) -> &Arc<JobStateCoordinator> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub fn blob(&self) -> &Arc<dyn BlobStore> {
        &self.blob
    }

    /// Summarize `video_id` into `lang`.
    pub async fn run(&self, video_id: &str, lang: Language) -> PipelineResult<RunOutput> {
        let key = VideoKey::new(video_id, lang);
        let logger = JobLogger::new(&key, "summarize");
        let span = logger.create_span();
        let start = Instant::now();

        let result = self.run_stages(&key, &logger).instrument(span).await;

        let outcome = match &result {
            Ok(output) if output.cached => "cached",
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        record_run(outcome, start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => logger.log_completion(outcome),
            Err(PipelineError::AlreadyInFlight(_)) => {}
            Err(e) => logger.log_error(&e.to_string()),
        }
        result
    }

    async fn run_stages(&self, key: &VideoKey, logger: &JobLogger) -> PipelineResult<RunOutput> {
        let video_id = key.video_id.as_str();
        let lang = key.language;

        if let Admission::AlreadyInFlight(state) = self.coordinator.admit(key.clone(), JobMetadata::default())
        {
            return Err(PipelineError::AlreadyInFlight(Box::new(state)));
        }
        logger.log_start("admitted");

        if let Some(output) = self.cached(key).await {
            logger.log_progress("served from completed article");
            return Ok(output);
        }

        // Metadata
        self.advance(key, LifecycleStatus::ProcessingMetadata, JobMetadata::default());
        let metadata = timed("metadata", self.metadata.fetch(video_id)).await?;
        self.advance(key, LifecycleStatus::MetadataProcessed, metadata_view(&metadata));

        let Some(track) = metadata.caption_for(lang).cloned() else {
            logger.log_warning("no caption track for requested language");
            if let Err(e) = self
                .store
                .mark_failed(video_id, lang, ArticleStatus::CaptionUnavailable)
                .await
            {
                warn!(video_id, lang = %lang, "Failed to record caption-unavailable: {}", e);
            }
            return Err(PipelineError::CaptionUnavailable {
                video_id: video_id.to_string(),
                lang,
            });
        };

        // Caption
        self.advance(key, LifecycleStatus::ProcessingDownload, JobMetadata::default());
        let raw = timed("download", self.captions.fetch(&track))
            .await
            .map_err(PipelineError::CaptionFetch)?;
        let caption = sanitize(&raw);
        self.store_caption_detached(video_id, &caption);
        self.advance(key, LifecycleStatus::DownloadProcessed, JobMetadata::default());

        // Summary
        self.advance(key, LifecycleStatus::ProcessingSummarize, JobMetadata::default());
        let summary = timed(
            "summarize",
            self.summarizer.summarize(&caption, lang, &metadata.title),
        )
        .await?;
        let path = slugify(&metadata.title);
        self.advance(
            key,
            LifecycleStatus::SummarizeProcessed,
            JobMetadata {
                content: Some(summary.content.clone()),
                answer: Some(summary.answer.clone()),
                path: Some(path.clone()),
                ..Default::default()
            },
        );

        // Persist
        let fields = LanguageFields {
            title: metadata.title.clone(),
            content: summary.content.clone(),
            answer: summary.answer.clone(),
            path,
            status: ArticleStatus::Completed,
        };
        let video = VideoFields::from(&metadata);
        timed("persist", self.store.upsert_language(video_id, lang, &fields, &video)).await?;

        let record = match self.store.get(video_id).await {
            Ok(Some(record)) => record,
            Ok(None) | Err(_) => {
                let mut record = ArticleRecord::new(video_id);
                record.apply_language(lang, &fields);
                record.apply_video_fields_if_absent(&video);
                record
            }
        };

        Ok(RunOutput {
            summary,
            record,
            cached: false,
        })
    }

    /// A completed article for the key, if the durable record has one.
    async fn cached(&self, key: &VideoKey) -> Option<RunOutput> {
        let record = match self.store.get(&key.video_id).await {
            Ok(record) => record?,
            Err(e) => {
                warn!(video_id = %key.video_id, "Article lookup failed, running pipeline: {}", e);
                return None;
            }
        };
        let summary = record.summary(key.language)?;

        self.advance(
            key,
            LifecycleStatus::SummarizeProcessed,
            JobMetadata {
                title: record.title.get(&key.language).cloned(),
                channel_id: record.channel_id.clone(),
                channel_name: record.channel_name.clone(),
                category: record.category.clone(),
                upload_date: record.upload_date.clone(),
                duration: record.duration,
                content: Some(summary.content.clone()),
                answer: Some(summary.answer.clone()),
                path: record.path.get(&key.language).cloned(),
            },
        );

        Some(RunOutput {
            summary,
            record,
            cached: true,
        })
    }

    fn advance(&self, key: &VideoKey, status: LifecycleStatus, delta: JobMetadata) {
        // A long run may outlive its admission window
        if !self.coordinator.advance(key, status, delta) {
            tracing::debug!(key = %key, status = %status, "Status not advanced");
        }
    }

    fn store_caption_detached(&self, video_id: &str, caption: &str) {
        let blob = Arc::clone(&self.blob);
        let video_id = video_id.to_string();
        let caption = caption.to_string();
        tokio::spawn(
            async move {
                if let Err(e) = blob.put_caption(&video_id, &caption).await {
                    record_blob_write_failure();
                    warn!(video_id = %video_id, "Caption blob write failed: {}", e);
                }
            }
            .in_current_span(),
        );
    }
}

/// Descriptive fields exposed on status polls once metadata is known.
fn metadata_view(metadata: &VideoMetadata) -> JobMetadata {
    JobMetadata {
        title: Some(metadata.title.clone()),
        channel_id: Some(metadata.channel_id.clone()),
        channel_name: Some(metadata.channel_name.clone()),
        category: Some(metadata.category.clone()),
        upload_date: Some(metadata.publish_date.clone()),
        duration: Some(metadata.length_seconds),
        ..Default::default()
    }
}

async fn timed<T, F: Future<Output = T>>(stage: &'static str, future: F) -> T {
    let start = Instant::now();
    let output = future.await;
    record_stage(stage, start.elapsed().as_secs_f64());
    output
}
