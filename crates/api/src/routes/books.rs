//! Route definitions for `/books`, including the book-scoped chapter routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{books, chapters};
use crate::state::AppState;

/// Routes mounted at `/books`.
///
/// ```text
/// GET    /                           -> list
/// POST   /                           -> create
/// POST   /import                     -> import_new (multipart)
/// GET    /{id}                       -> get
/// PUT    /{id}                       -> update
/// DELETE /{id}                       -> delete
/// POST   /{id}/import                -> reimport (multipart)
/// GET    /{id}/import-status         -> import_status
/// POST   /{id}/deep-scan             -> deep_scan
/// GET    /{id}/export                -> export (markdown)
/// POST   /{id}/cover                 -> upload_cover (multipart)
/// GET    /{id}/chapters              -> chapters::list_by_book
/// POST   /{id}/chapters              -> chapters::create
/// GET    /{id}/chapters/next-number  -> chapters::next_number
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(books::list).post(books::create))
        .route("/import", post(books::import_new))
        .route("/{id}", get(books::get).put(books::update).delete(books::delete))
        .route("/{id}/import", post(books::reimport))
        .route("/{id}/import-status", get(books::import_status))
        .route("/{id}/deep-scan", post(books::deep_scan))
        .route("/{id}/export", get(books::export))
        .route("/{id}/cover", post(books::upload_cover))
        .route("/{id}/chapters", get(chapters::list_by_book).post(chapters::create))
        .route("/{id}/chapters/next-number", get(chapters::next_number))
}
