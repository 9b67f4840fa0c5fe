//! LLM providers for the story bible pipeline.
//!
//! Two hosted providers are supported, DeepSeek (OpenAI-compatible chat
//! completions) and Google Gemini (`generateContent`). Both sit behind the
//! [`LlmClient`] trait so pipeline code can be driven by
//! [`mock::ScriptedLlm`] in tests.

pub mod client;
pub mod config;
pub mod deepseek;
pub mod error;
pub mod gemini;
pub mod json;
pub mod mock;
pub mod retry;

use std::sync::Arc;

pub use client::{CompletionRequest, LlmClient};
pub use config::{LlmConfig, LlmProvider};
pub use error::LlmError;
pub use json::{complete_json, complete_text, extract_json};

/// Build the configured provider. A missing API key is not an error here;
/// calls fail with [`LlmError::MissingApiKey`] instead.
pub fn build_client(config: &LlmConfig) -> Arc<dyn LlmClient> {
    match config.provider {
        LlmProvider::DeepSeek => Arc::new(deepseek::DeepSeekClient::new(config)),
        LlmProvider::Gemini => Arc::new(gemini::GeminiClient::new(config)),
    }
}
