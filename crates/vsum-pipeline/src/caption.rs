//! Caption download and sanitization.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;
use vsum_models::CaptionTrack;

use crate::error::{FetchError, FetchResult};
use crate::retry::{retry_async, RetryConfig};

/// Karaoke blocks: a blank line followed by anything up to a `</c>` line end.
static KARAOKE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\n[\s\S]*?</c>\n").unwrap());

/// Positioning cue settings emitted by auto-generated tracks.
const POSITION_METADATA: &str = "align:start position:0%";

/// Strip karaoke markup and positioning metadata from a raw subtitle stream.
///
/// Both rewrites are applied until the text stops changing, so
/// `sanitize(sanitize(x)) == sanitize(x)` for every input.
pub fn sanitize(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = KARAOKE_BLOCK
            .replace_all(&current, "\n")
            .replace(POSITION_METADATA, "");
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Downloads the text of a caption track.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, track: &CaptionTrack) -> FetchResult<String>;
}

/// Plain HTTP caption downloader.
#[derive(Clone)]
pub struct HttpCaptionFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpCaptionFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            retry: RetryConfig::new("caption_download"),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn download(&self, url: &str) -> FetchResult<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::status(status.as_u16(), body));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl CaptionSource for HttpCaptionFetcher {
    async fn fetch(&self, track: &CaptionTrack) -> FetchResult<String> {
        let text = retry_async(&self.retry, FetchError::is_retryable, || {
            self.download(&track.url)
        })
        .await
        .into_result()?;

        debug!(
            lang = %track.language_code,
            bytes = text.len(),
            "Downloaded caption track"
        );
        Ok(text)
    }
}
