//! Pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::retry::RetryConfig;

/// Where video metadata comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataBackend {
    /// Scrape the watch page.
    #[default]
    Direct,
    /// Third-party download API.
    Downsub,
}

impl FromStr for MetadataBackend {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "direct" => Ok(Self::Direct),
            "downsub" => Ok(Self::Downsub),
            other => Err(PipelineError::config(format!(
                "unknown METADATA_BACKEND: {other}"
            ))),
        }
    }
}

/// Which LLM provider completes prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProviderKind {
    /// Chat-completions API (DeepSeek).
    #[default]
    Chat,
    /// Gemini `generateContent`.
    Gemini,
}

impl FromStr for LlmProviderKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "deepseek" | "chat" => Ok(Self::Chat),
            "gemini" => Ok(Self::Gemini),
            other => Err(PipelineError::config(format!("unknown LLM_PROVIDER: {other}"))),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub metadata_backend: MetadataBackend,
    /// Watch page origin for the direct back-end
    pub youtube_base_url: String,
    /// Outbound proxy for watch pages and caption downloads
    pub proxy_server: Option<String>,
    pub downsub_base_url: String,
    pub downsub_api_key: Option<String>,

    pub llm_provider: LlmProviderKind,
    pub deepseek_api_url: String,
    pub deepseek_api_key: Option<String>,
    pub deepseek_model: String,
    pub gemini_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    /// Per-call deadline for metadata and caption requests
    pub http_timeout: Duration,
    /// Per-call deadline for LLM requests
    pub llm_timeout: Duration,
    pub llm_retry: RetryConfig,

    /// Coordinator expiry window
    pub job_ttl: Duration,
    /// Coordinator janitor period
    pub cleanup_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metadata_backend: MetadataBackend::Direct,
            youtube_base_url: "https://www.youtube.com".to_string(),
            proxy_server: None,
            downsub_base_url: "https://api.downsub.com/download".to_string(),
            downsub_api_key: None,
            llm_provider: LlmProviderKind::Chat,
            deepseek_api_url: "https://api.deepseek.com/chat/completions".to_string(),
            deepseek_api_key: None,
            deepseek_model: "deepseek-chat".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            http_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            llm_retry: RetryConfig::new("llm_complete"),
            job_ttl: Duration::from_secs(20),
            cleanup_interval: Duration::from_secs(5),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();

        let metadata_backend: MetadataBackend = std::env::var("METADATA_BACKEND")
            .unwrap_or_default()
            .parse()?;
        let llm_provider: LlmProviderKind = std::env::var("LLM_PROVIDER")
            .unwrap_or_default()
            .parse()?;

        let llm_retry = RetryConfig::new("llm_complete")
            .with_base_delay(Duration::from_millis(env_u64("LLM_RETRY_BASE_MS", 500)))
            .with_max_delay(Duration::from_millis(env_u64("LLM_RETRY_MAX_MS", 8000)));

        let config = Self {
            metadata_backend,
            youtube_base_url: env_string("YOUTUBE_BASE_URL").unwrap_or(defaults.youtube_base_url),
            proxy_server: env_string("PROXY_SERVER"),
            downsub_base_url: env_string("DOWNSUB_BASE_URL").unwrap_or(defaults.downsub_base_url),
            downsub_api_key: env_string("DOWNSUB_API_KEY"),
            llm_provider,
            deepseek_api_url: env_string("DEEPSEEK_API_URL").unwrap_or(defaults.deepseek_api_url),
            deepseek_api_key: env_string("DEEPSEEK_API_KEY"),
            deepseek_model: env_string("DEEPSEEK_MODEL").unwrap_or(defaults.deepseek_model),
            gemini_base_url: env_string("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            gemini_api_key: env_string("GEMINI_API_KEY"),
            gemini_model: env_string("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            http_timeout: Duration::from_secs(env_u64("HTTP_TIMEOUT_SECS", 30)),
            llm_timeout: Duration::from_secs(env_u64("LLM_TIMEOUT_SECS", 120)),
            llm_retry,
            job_ttl: Duration::from_secs(env_u64("JOB_TTL_SECS", 20)),
            cleanup_interval: defaults.cleanup_interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the selected back-ends have their credentials.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.metadata_backend == MetadataBackend::Downsub && self.downsub_api_key.is_none() {
            return Err(PipelineError::config(
                "DOWNSUB_API_KEY must be set when METADATA_BACKEND=downsub",
            ));
        }
        match self.llm_provider {
            LlmProviderKind::Chat if self.deepseek_api_key.is_none() => Err(PipelineError::config(
                "DEEPSEEK_API_KEY must be set when LLM_PROVIDER=deepseek",
            )),
            LlmProviderKind::Gemini if self.gemini_api_key.is_none() => Err(PipelineError::config(
                "GEMINI_API_KEY must be set when LLM_PROVIDER=gemini",
            )),
            _ => Ok(()),
        }
    }

    /// Model tag for the selected provider.
    pub fn llm_model(&self) -> &str {
        match self.llm_provider {
            LlmProviderKind::Chat => &self.deepseek_model,
            LlmProviderKind::Gemini => &self.gemini_model,
        }
    }

    /// HTTP client for metadata and caption requests, routed through the
    /// proxy when one is configured.
    pub fn fetch_http_client(&self) -> PipelineResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.http_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("vsum-pipeline/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = &self.proxy_server {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| PipelineError::config(format!("invalid PROXY_SERVER: {e}")))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))
    }

    /// HTTP client for LLM providers.
    pub fn llm_http_client(&self) -> PipelineResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.llm_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("direct".parse::<MetadataBackend>().unwrap(), MetadataBackend::Direct);
        assert_eq!(" DownSub ".parse::<MetadataBackend>().unwrap(), MetadataBackend::Downsub);
        assert_eq!("".parse::<MetadataBackend>().unwrap(), MetadataBackend::Direct);
        assert!("ytdlp".parse::<MetadataBackend>().is_err());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("deepseek".parse::<LlmProviderKind>().unwrap(), LlmProviderKind::Chat);
        assert_eq!("chat".parse::<LlmProviderKind>().unwrap(), LlmProviderKind::Chat);
        assert_eq!("Gemini".parse::<LlmProviderKind>().unwrap(), LlmProviderKind::Gemini);
        assert!("openai-realtime".parse::<LlmProviderKind>().is_err());
    }

    #[test]
    fn test_validate_requires_selected_credentials() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_err());

        config.deepseek_api_key = Some("sk-test".into());
        assert!(config.validate().is_ok());

        config.metadata_backend = MetadataBackend::Downsub;
        assert!(config.validate().is_err());
        config.downsub_api_key = Some("ds-key".into());
        assert!(config.validate().is_ok());

        config.llm_provider = LlmProviderKind::Gemini;
        assert!(config.validate().is_err());
        config.gemini_api_key = Some("g-key".into());
        assert!(config.validate().is_ok());
        assert_eq!(config.llm_model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.job_ttl, Duration::from_secs(20));
        assert_eq!(config.cleanup_interval, Duration::from_secs(5));
        assert_eq!(config.llm_retry.max_attempts(), 3);
        assert_eq!(config.llm_model(), "deepseek-chat");
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = PipelineConfig {
            proxy_server: Some("http://[bad".into()),
            ..Default::default()
        };
        assert!(config.fetch_http_client().is_err());
    }
}
