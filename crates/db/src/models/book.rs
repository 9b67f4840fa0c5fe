//! Book entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::books::progress_percentage;
use storybible_core::types::{Date, DbId, Timestamp};

/// A book row from the `books` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub series_order: i32,
    pub description: String,
    pub word_count_target: i32,
    pub current_word_count: i32,
    pub status: String,
    pub import_progress: i32,
    pub import_status_message: String,
    pub last_import_update: Option<Timestamp>,
    pub started_date: Option<Date>,
    pub completed_date: Option<Date>,
    pub cover_image_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Book {
    pub fn progress_percentage(&self) -> i32 {
        progress_percentage(self.current_word_count, self.word_count_target)
    }
}

/// API view of a book with its derived writing progress.
#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub progress_percentage: i32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let progress_percentage = book.progress_percentage();
        Self {
            book,
            progress_percentage,
        }
    }
}

/// DTO for creating a new book.
///
/// A missing `series_order` takes the next free position for the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub series_order: Option<i32>,
    pub description: Option<String>,
    pub word_count_target: Option<i32>,
    pub status: Option<String>,
    pub started_date: Option<Date>,
    pub completed_date: Option<Date>,
}

/// DTO for updating an existing book. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub series_order: Option<i32>,
    pub description: Option<String>,
    pub word_count_target: Option<i32>,
    pub status: Option<String>,
    pub started_date: Option<Date>,
    pub completed_date: Option<Date>,
}

/// Import/deep-scan progress as polled by clients.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportStatus {
    pub id: DbId,
    pub status: String,
    pub import_progress: i32,
    pub import_status_message: String,
    pub last_import_update: Option<Timestamp>,
}
