//! Background runner for import and deep-scan jobs.
//!
//! Jobs run on Tokio tasks tracked by a [`TaskTracker`]. A semaphore bounds
//! how many run at once, and a per-book slot keeps a second job for the
//! same book from being queued while one is pending or running.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use storybible_core::error::CoreError;
use storybible_core::types::DbId;
use storybible_pipeline::deep_scan::{run_deep_scan, DeepScanJob};
use storybible_pipeline::import::{run_import, ImportJob};
use storybible_pipeline::PipelineContext;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Work the runner knows how to execute.
#[derive(Debug, Clone)]
pub enum BookJob {
    Import(ImportJob),
    DeepScan(DeepScanJob),
}

impl BookJob {
    pub fn book_id(&self) -> DbId {
        match self {
            BookJob::Import(job) => job.book_id,
            BookJob::DeepScan(job) => job.book_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BookJob::Import(_) => "import",
            BookJob::DeepScan(_) => "deep_scan",
        }
    }
}

type ActiveBooks = Arc<Mutex<HashSet<DbId>>>;

/// Exclusive claim on a book until the job holding it finishes.
#[derive(Debug)]
pub struct BookSlot {
    book_id: DbId,
    active: ActiveBooks,
}

impl Drop for BookSlot {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.book_id);
        }
    }
}

#[derive(Clone)]
pub struct JobRunner {
    ctx: PipelineContext,
    permits: Arc<Semaphore>,
    active: ActiveBooks,
    tracker: TaskTracker,
}

impl JobRunner {
    /// `ctx.cancel` stops queued and running jobs on shutdown.
    pub fn new(ctx: PipelineContext, max_concurrent: usize) -> Self {
        Self {
            ctx,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            active: Arc::new(Mutex::new(HashSet::new())),
            tracker: TaskTracker::new(),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.ctx.cancel
    }

    /// Claim a book, failing with a conflict when it already has a job.
    pub fn reserve(&self, book_id: DbId) -> Result<BookSlot, CoreError> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| CoreError::Internal("job registry poisoned".into()))?;
        if !active.insert(book_id) {
            return Err(CoreError::Conflict(format!(
                "Book {book_id} already has an import or deep scan in progress"
            )));
        }
        Ok(BookSlot {
            book_id,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_busy(&self, book_id: DbId) -> bool {
        self.active.lock().map(|a| a.contains(&book_id)).unwrap_or(false)
    }

    /// Start `job` in the background. The slot is released when it ends.
    pub fn spawn(&self, slot: BookSlot, job: BookJob) {
        let ctx = self.ctx.clone();
        let permits = Arc::clone(&self.permits);

        self.tracker.spawn(async move {
            let _slot = slot;
            let book_id = job.book_id();
            let kind = job.kind();

            // On shutdown the job still runs once so it records the interruption.
            let _permit = tokio::select! {
                _ = ctx.cancel.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };

            tracing::info!(book_id, kind, "Job started");
            let outcome = match job {
                BookJob::Import(job) => run_import(&ctx, job).await.map(|_| ()),
                BookJob::DeepScan(job) => run_deep_scan(&ctx, job).await.map(|_| ()),
            };
            match outcome {
                Ok(()) => tracing::info!(book_id, kind, "Job finished"),
                Err(e) => tracing::warn!(book_id, kind, error = %e, "Job ended with an error"),
            }
        });
    }

    /// Wait for every spawned job to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel outstanding jobs and wait for them to record their state.
    pub async fn shutdown(&self) {
        self.ctx.cancel.cancel();
        self.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use sqlx::postgres::PgPoolOptions;
    use storybible_llm::mock::ScriptedLlm;

    use super::*;

    fn runner() -> JobRunner {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let ctx = PipelineContext::new(pool, Arc::new(ScriptedLlm::new(Vec::new())), CancellationToken::new());
        JobRunner::new(ctx, 2)
    }

    #[tokio::test]
    async fn second_reservation_for_a_book_conflicts() {
        let jobs = runner();
        let slot = jobs.reserve(7).unwrap();
        assert!(jobs.is_busy(7));
        assert_matches!(jobs.reserve(7), Err(CoreError::Conflict(_)));
        assert!(jobs.reserve(8).is_ok());

        drop(slot);
        assert!(!jobs.is_busy(7));
        assert!(jobs.reserve(7).is_ok());
    }
}
