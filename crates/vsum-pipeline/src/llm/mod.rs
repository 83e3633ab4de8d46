//! Uniform completion interface over the supported LLM providers.
//!
//! Both providers retry transient failures (network errors, 429, 5xx) with
//! exponential backoff and surface permanent failures immediately.

mod chat;
mod gemini;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::warn;

pub use chat::ChatCompletionsClient;
pub use gemini::GeminiClient;

use crate::config::{LlmProviderKind, PipelineConfig};
use crate::error::{LlmError, PipelineError, PipelineResult};
use crate::metrics::record_llm_request;
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Text completion capability.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider label for logs and metrics.
    fn provider(&self) -> &'static str;

    /// Complete `user` under the `system` instructions with `model`.
    async fn complete(&self, system: &str, user: &str, model: &str) -> Result<String, LlmError>;
}

/// Build the client selected by `LLM_PROVIDER`.
pub fn build_llm_client(config: &PipelineConfig) -> PipelineResult<Arc<dyn LlmClient>> {
    let http = config.llm_http_client()?;
    let client: Arc<dyn LlmClient> = match config.llm_provider {
        LlmProviderKind::Chat => {
            let api_key = config
                .deepseek_api_key
                .clone()
                .ok_or_else(|| PipelineError::config("DEEPSEEK_API_KEY not set"))?;
            Arc::new(
                ChatCompletionsClient::new(http, &config.deepseek_api_url, api_key)
                    .with_retry(config.llm_retry.clone()),
            )
        }
        LlmProviderKind::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| PipelineError::config("GEMINI_API_KEY not set"))?;
            Arc::new(
                GeminiClient::new(http, &config.gemini_base_url, api_key)
                    .with_retry(config.llm_retry.clone()),
            )
        }
    };
    Ok(client)
}

/// Run one provider call under the retry policy, recording each attempt.
pub(crate) async fn complete_with_retry<F, Fut>(
    provider: &'static str,
    retry: &RetryConfig,
    attempt: F,
) -> Result<String, LlmError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<String, LlmError>>,
{
    let result = retry_async(retry, |e: &LlmError| e.transient, || {
        let call = attempt();
        async move {
            let start = Instant::now();
            let result = call.await;
            let status = match &result {
                Ok(_) => "ok",
                Err(e) if e.transient => "transient_error",
                Err(_) => "permanent_error",
            };
            record_llm_request(provider, status, start.elapsed().as_secs_f64());
            result
        }
    })
    .await;

    match result {
        RetryResult::Success(text) => Ok(text),
        RetryResult::Failed { error, attempts } => {
            warn!(provider, attempts, transient = error.transient, "LLM completion failed: {}", error);
            Err(error)
        }
    }
}
