use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chapters;
use crate::state::AppState;

/// Routes mounted at `/chapters`. Listing and creation live under `/books`.
///
/// ```text
/// GET    /{id}         -> get
/// PUT    /{id}         -> update
/// DELETE /{id}         -> delete
/// POST   /{id}/assist  -> assist
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(chapters::get).put(chapters::update).delete(chapters::delete))
        .route("/{id}/assist", post(chapters::assist))
}
