/// Errors from a single LLM completion.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key configured for the selected provider.
    #[error("{0} API key is not configured")]
    MissingApiKey(&'static str),

    /// Network, DNS, TLS or timeout failure.
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("LLM provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response carried no text.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// The response body or its JSON payload could not be decoded.
    #[error("Failed to parse LLM response: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether another attempt may succeed. Client errors other than
    /// 429 are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::MissingApiKey(_) | LlmError::Parse(_) => false,
            LlmError::Request(_) | LlmError::EmptyResponse => true,
            LlmError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        }
    }
}
