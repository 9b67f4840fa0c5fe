//! Import / deep-scan progress written to the book row.

use sqlx::PgPool;
use storybible_core::types::DbId;
use storybible_db::repositories::BookRepo;

use crate::error::PipelineError;

/// Progress reporter for one book.
pub struct BookProgress<'a> {
    pool: &'a PgPool,
    book_id: DbId,
}

impl<'a> BookProgress<'a> {
    pub fn new(pool: &'a PgPool, book_id: DbId) -> Self {
        Self { pool, book_id }
    }

    /// Write progress and message, keeping the status.
    pub async fn report(&self, progress: i32, message: &str) -> Result<(), PipelineError> {
        tracing::debug!(book_id = self.book_id, progress, message, "Job progress");
        self.write(None, progress, message).await
    }

    /// Write progress and message together with a new status.
    pub async fn report_status(&self, status: &str, progress: i32, message: &str) -> Result<(), PipelineError> {
        self.write(Some(status), progress, message).await
    }

    /// Change status and message, leaving progress where it was.
    pub async fn message(&self, status: Option<&str>, message: &str) -> Result<(), PipelineError> {
        BookRepo::update_status_message(self.pool, self.book_id, status, message).await?;
        Ok(())
    }

    async fn write(&self, status: Option<&str>, progress: i32, message: &str) -> Result<(), PipelineError> {
        let updated =
            BookRepo::update_progress(self.pool, self.book_id, status, progress, message).await?;
        if !updated {
            return Err(PipelineError::not_found("book", self.book_id));
        }
        Ok(())
    }
}
