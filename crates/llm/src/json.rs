//! Pulling JSON out of model replies, and the degrade-to-`None` helpers the
//! pipeline calls.

use serde_json::Value;

use crate::client::{CompletionRequest, LlmClient};

/// Parse the JSON payload of a model reply.
///
/// Accepts bare JSON, JSON inside a ```json fence, or JSON surrounded by
/// prose (the outermost `{...}` or `[...]` span is tried).
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = strip_fence(text.trim());
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    for (open, close) in [('{', '}'), ('[', ']')] {
        let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) else {
            continue;
        };
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Some(value);
            }
        }
    }
    None
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Run a completion and return its text, or `None` once the provider is
/// exhausted. Failures are logged under `task`.
pub async fn complete_text(
    client: &dyn LlmClient,
    task: &str,
    request: &CompletionRequest,
) -> Option<String> {
    match client.complete(request).await {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(provider = client.name(), task, error = %e, "LLM completion unavailable");
            None
        }
    }
}

/// Run a JSON completion and parse the reply, or `None` on provider failure
/// or unparseable output.
pub async fn complete_json(
    client: &dyn LlmClient,
    task: &str,
    request: &CompletionRequest,
) -> Option<Value> {
    let text = complete_text(client, task, request).await?;
    let value = extract_json(&text);
    if value.is_none() {
        tracing::warn!(
            provider = client.name(),
            task,
            reply_chars = text.len(),
            "LLM reply was not valid JSON"
        );
    }
    value
}
