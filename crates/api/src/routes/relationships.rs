use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::relationships;
use crate::state::AppState;

/// Routes mounted at `/relationships`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /graph             -> graph (?book_id=)
/// POST   /analyze           -> analyze
/// POST   /sync-from-cache   -> sync
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(relationships::list).post(relationships::create))
        .route("/graph", get(relationships::graph))
        .route("/analyze", post(relationships::analyze))
        .route("/sync-from-cache", post(relationships::sync))
        .route("/{id}", put(relationships::update).delete(relationships::delete))
}
