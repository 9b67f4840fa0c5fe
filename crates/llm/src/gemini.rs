//! Google Gemini `generateContent`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{CompletionRequest, LlmClient};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::retry::RetryPolicy;

const PROVIDER: &str = "Gemini";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiClient {
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

    fn body<'a>(&self, request: &'a CompletionRequest) -> GeminiRequest<'a> {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system.as_deref().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: request.json.then_some("application/json"),
            },
        }
    }

    async fn send_once(&self, api_key: &str, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
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

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        candidate_text(parsed)
    }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(response: GeminiResponse) -> Result<String, LlmError> {
    if let Some(error) = response.error {
        return Err(LlmError::Parse(format!("Gemini API error: {}", error.message)));
    }
    let text: String = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey(PROVIDER))?;
        tracing::debug!(model = %self.model, prompt_chars = request.prompt.len(), "Gemini request");
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
    use crate::config::{LlmProvider, GEMINI_BASE_URL};

    fn client() -> GeminiClient {
        GeminiClient::new(&LlmConfig {
            provider: LlmProvider::Gemini,
            api_key: None,
            model: "gemini-1.5-flash".into(),
            base_url: GEMINI_BASE_URL.into(),
            max_attempts: 1,
            backoff_base_ms: 0,
            timeout_secs: 5,
        })
    }

    #[test]
    fn request_body_shape() {
        let request = CompletionRequest::new("Describe Elara").with_system("You are an editor.").json();
        let body = serde_json::to_value(client().body(&request)).unwrap();
        assert_eq!(
            body["contents"],
            json!([{"role": "user", "parts": [{"text": "Describe Elara"}]}])
        );
        assert_eq!(
            body["systemInstruction"],
            json!({"parts": [{"text": "You are an editor."}]})
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn joins_text_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }))
        .unwrap();
        assert_eq!(candidate_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn api_error_and_empty_candidates() {
        let response: GeminiResponse =
            serde_json::from_value(json!({"error": {"message": "quota"}})).unwrap();
        assert_matches!(candidate_text(response), Err(LlmError::Parse(msg)) if msg.contains("quota"));

        let response: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert_matches!(candidate_text(response), Err(LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let result = client().complete(&CompletionRequest::new("Hello")).await;
        assert_matches!(result, Err(LlmError::MissingApiKey("Gemini")));
    }
}
