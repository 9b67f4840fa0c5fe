//! A scripted provider for tests: replies are returned in order and every
//! request is recorded.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{CompletionRequest, LlmClient};
use crate::error::LlmError;

#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Successful replies only.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub fn push_reply(&self, reply: Result<String, LlmError>) {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    /// Once the script runs out every call fails with `EmptyResponse`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn replies_in_order_then_empty() {
        let llm = ScriptedLlm::with_replies(["one", "two"]);
        let req = CompletionRequest::new("prompt");
        assert_eq!(llm.complete(&req).await.unwrap(), "one");
        assert_eq!(llm.complete(&req).await.unwrap(), "two");
        assert_matches!(llm.complete(&req).await, Err(LlmError::EmptyResponse));
        assert_eq!(llm.call_count(), 3);
        assert_eq!(llm.requests()[0].prompt, "prompt");
    }
}
