//! DeepSeek chat completions (OpenAI-compatible wire format).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{CompletionRequest, LlmClient};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::retry::RetryPolicy;

const PROVIDER: &str = "DeepSeek";

pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl DeepSeekClient {
    pub fn new(config: &LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            retry: RetryPolicy::new(config.max_attempts, config.backoff_base_ms),
        }
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });
        ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    async fn send_once(&self, api_key: &str, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        first_choice_text(parsed)
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey(PROVIDER))?;
        tracing::debug!(model = %self.model, prompt_chars = request.prompt.len(), "DeepSeek request");
        self.retry
            .run(PROVIDER, || self.send_once(api_key, request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::config::LlmProvider;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::DeepSeek,
            api_key: api_key.map(String::from),
            model: "deepseek-chat".into(),
            base_url: "http://127.0.0.1:9".into(),
            max_attempts: 1,
            backoff_base_ms: 0,
            timeout_secs: 5,
        }
    }

    #[test]
    fn request_body_shape() {
        let client = DeepSeekClient::new(&config(Some("k")));
        let request = CompletionRequest::new("List the characters").with_system("Be terse").json();
        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "Be terse"},
                {"role": "user", "content": "List the characters"}
            ])
        );
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
    }

    #[test]
    fn plain_request_omits_response_format() {
        let client = DeepSeekClient::new(&config(Some("k")));
        let request = CompletionRequest::new("Hello");
        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_first_choice() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
        }))
        .unwrap();
        assert_eq!(first_choice_text(response).unwrap(), "Hi there");
    }

    #[test]
    fn blank_content_is_empty_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "  "}}]
        }))
        .unwrap();
        assert_matches!(first_choice_text(response), Err(LlmError::EmptyResponse));

        let response: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert_matches!(first_choice_text(response), Err(LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let client = DeepSeekClient::new(&config(None));
        let result = client.complete(&CompletionRequest::new("Hello")).await;
        assert_matches!(result, Err(LlmError::MissingApiKey("DeepSeek")));
    }
}
