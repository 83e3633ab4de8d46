//! Gemini `generateContent` provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{complete_with_retry, LlmClient};
use crate::error::LlmError;
use crate::retry::RetryConfig;

const PROVIDER: &str = "gemini";

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryConfig::new("llm_complete"),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, system: &str, user: &str, model: &str) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        // Single part: system instructions, newline, user prompt
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{}\n{}", system, user),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::transient(format!("Failed to read {} response: {}", PROVIDER, e)))?;

        if !status.is_success() {
            return Err(LlmError::from_status(PROVIDER, status.as_u16(), &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::permanent(format!("Failed to parse {} response: {}", PROVIDER, e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::permanent("No candidates[0].content.parts[0].text in response"))?;

        debug!(provider = PROVIDER, chars = text.len(), "Completion received");
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, system: &str, user: &str, model: &str) -> Result<String, LlmError> {
        complete_with_retry(PROVIDER, &self.retry, || self.send_once(system, user, model)).await
    }
}
