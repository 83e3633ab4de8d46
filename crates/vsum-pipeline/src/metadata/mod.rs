//! Video metadata retrieval.
//!
//! Two interchangeable back-ends produce the same [`VideoMetadata`] shape:
//! a scrape of the watch page ([`DirectSource`]) and the Downsub API
//! ([`DownsubSource`]). [`MetadataFetcher`] adds the retry policy and the
//! caption language filter on top of whichever one is configured.

mod direct;
mod downsub;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};
use vsum_models::VideoMetadata;

pub use direct::DirectSource;
pub use downsub::DownsubSource;

use crate::config::{MetadataBackend, PipelineConfig};
use crate::error::{FetchError, FetchResult, PipelineError, PipelineResult};
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// A metadata back-end.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Back-end label for logs.
    fn name(&self) -> &'static str;

    /// Fetch unfiltered metadata for `video_id`.
    async fn fetch(&self, video_id: &str) -> FetchResult<VideoMetadata>;
}

/// Fetches metadata through the configured back-end.
#[derive(Clone)]
pub struct MetadataFetcher {
    source: Arc<dyn MetadataSource>,
    retry: RetryConfig,
}

impl MetadataFetcher {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            retry: RetryConfig::new("metadata_fetch")
                .with_max_retries(1)
                .with_base_delay(Duration::from_millis(500)),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the back-end selected by `METADATA_BACKEND`.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let http = config.fetch_http_client()?;
        let source: Arc<dyn MetadataSource> = match config.metadata_backend {
            MetadataBackend::Direct => Arc::new(DirectSource::new(http, &config.youtube_base_url)),
            MetadataBackend::Downsub => {
                let api_key = config
                    .downsub_api_key
                    .clone()
                    .ok_or_else(|| PipelineError::config("DOWNSUB_API_KEY not set"))?;
                Arc::new(DownsubSource::new(http, &config.downsub_base_url, api_key))
            }
        };
        Ok(Self::new(source))
    }

    /// Fetch metadata, retrying once, with captions outside the allow-list
    /// removed.
    pub async fn fetch(&self, video_id: &str) -> PipelineResult<VideoMetadata> {
        let result = retry_async(&self.retry, |_: &FetchError| true, || self.source.fetch(video_id)).await;

        match result {
            RetryResult::Success(mut metadata) => {
                let before = metadata.captions.len();
                metadata.retain_allowed_captions();
                debug!(
                    video_id,
                    backend = self.source.name(),
                    tracks = metadata.captions.len(),
                    dropped = before - metadata.captions.len(),
                    "Fetched video metadata"
                );
                Ok(metadata)
            }
            RetryResult::Failed { error, attempts } => {
                warn!(
                    video_id,
                    backend = self.source.name(),
                    attempts,
                    "Metadata fetch failed: {}", error
                );
                Err(PipelineError::MetadataUnavailable(error.to_string()))
            }
        }
    }
}

/// Accept a count encoded either as a JSON number or a numeric string.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Number(n)) => n,
        Some(Count::Float(f)) if f.is_finite() && f >= 0.0 => f as u64,
        Some(Count::Text(s)) => s.trim().replace(',', "").parse().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vsum_models::{CaptionTrack, Language};

    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MetadataSource for FlakySource {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn fetch(&self, _video_id: &str) -> FetchResult<VideoMetadata> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(FetchError::parse("missing ytInitialPlayerResponse"));
            }
            Ok(VideoMetadata {
                title: "Song".into(),
                captions: vec![
                    CaptionTrack::new("https://c/ja", "ja"),
                    CaptionTrack::new("https://c/en", "EN"),
                    CaptionTrack::new("https://c/ru", "ru"),
                ],
                ..Default::default()
            })
        }
    }

    fn fetcher(failures: u32) -> (MetadataFetcher, Arc<FlakySource>) {
        let source = Arc::new(FlakySource {
            failures,
            calls: AtomicU32::new(0),
        });
        (MetadataFetcher::new(source.clone()), source)
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_captions_to_allow_list() {
        let (fetcher, _) = fetcher(0);
        let metadata = fetcher.fetch("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(metadata.captions.len(), 1);
        assert_eq!(metadata.captions[0].language_code, "en");
        assert!(metadata.caption_for(Language::En).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_once_on_any_failure() {
        let (fetcher, source) = fetcher(1);
        assert!(fetcher.fetch("dQw4w9WgXcQ").await.is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_failure_is_metadata_unavailable() {
        let (fetcher, source) = fetcher(2);
        let err = fetcher.fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, PipelineError::MetadataUnavailable(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lenient_counts() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "lenient_u64")]
            n: u64,
        }
        let parse = |json: &str| serde_json::from_str::<Row>(json).unwrap().n;
        assert_eq!(parse(r#"{"n": 42}"#), 42);
        assert_eq!(parse(r#"{"n": "1,234"}"#), 1234);
        assert_eq!(parse(r#"{"n": "n/a"}"#), 0);
        assert_eq!(parse(r#"{"n": null}"#), 0);
        assert_eq!(parse(r#"{}"#), 0);
    }
}
