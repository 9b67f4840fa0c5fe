//! LLM-assisted story bible jobs: manuscript import, relationship
//! synthesis, deep scan, and the consultant / focus-task helpers.
//!
//! Every job takes a [`PipelineContext`] carrying the pool, the LLM
//! provider and a cancellation token. Model failures degrade (skipped
//! batch, default tasks) rather than abort; only database and lookup
//! failures surface as [`PipelineError`].

pub mod assist;
pub mod deep_scan;
pub mod drafts;
pub mod error;
pub mod extract;
pub mod import;
pub mod progress;
pub mod prompts;
pub mod relationships;

use std::sync::Arc;

use sqlx::PgPool;
use storybible_llm::LlmClient;
use tokio_util::sync::CancellationToken;

pub use error::PipelineError;

/// Shared handles for a pipeline run.
#[derive(Clone)]
pub struct PipelineContext {
    pub pool: PgPool,
    pub llm: Arc<dyn LlmClient>,
    pub cancel: CancellationToken,
}

impl PipelineContext {
    pub fn new(pool: PgPool, llm: Arc<dyn LlmClient>, cancel: CancellationToken) -> Self {
        Self { pool, llm, cancel }
    }

    /// Fail with [`PipelineError::Cancelled`] once shutdown has begun.
    pub fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}
