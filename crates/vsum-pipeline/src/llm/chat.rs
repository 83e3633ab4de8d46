//! Chat-completions provider (DeepSeek and compatible APIs).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{complete_with_retry, LlmClient};
use crate::error::LlmError;
use crate::retry::RetryConfig;

const PROVIDER: &str = "deepseek";

/// Chat-completions API client.
pub struct ChatCompletionsClient {
    http: Client,
    api_url: String,
    api_key: String,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(http: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
            retry: RetryConfig::new("llm_complete"),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, system: &str, user: &str, model: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::permanent(format!("Failed to parse {} response: {}", PROVIDER, e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::permanent("No choices[0].message.content in response"))?;

        debug!(provider = PROVIDER, chars = content.len(), "Completion received");
        Ok(content)
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, system: &str, user: &str, model: &str) -> Result<String, LlmError> {
        complete_with_retry(PROVIDER, &self.retry, || self.send_once(system, user, model)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ChatCompletionsClient {
        ChatCompletionsClient::new(
            Client::new(),
            format!("{}/chat/completions", server.uri()),
            "sk-test",
        )
        .with_retry(RetryConfig::new("llm_complete").with_base_delay(Duration::from_millis(1)))
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "cmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "stream": false,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .complete("be brief", "hello", "deepseek-chat")
            .await
            .unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("third time")))
            .mount(&server)
            .await;

        let text = client(&server).complete("s", "u", "m").await.unwrap();
        assert_eq!(text, "third time");
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "u", "m").await.unwrap_err();
        assert!(err.transient);
    }

    #[tokio::test]
    async fn test_permanent_errors_surface_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "u", "m").await.unwrap_err();
        assert!(!err.transient);
        assert!(err.message.contains("401"));
    }

    #[tokio::test]
    async fn test_malformed_shape_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "u", "m").await.unwrap_err();
        assert!(!err.transient);
    }
}
