use axum::routing::{get, post};
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /            -> list (?book_id=&chapter_id=&character_id=&tag_id=)
/// POST   /            -> create
/// POST   /reorder     -> reorder
/// GET    /{id}        -> get
/// PUT    /{id}        -> update
/// DELETE /{id}        -> delete
/// POST   /{id}/move   -> move_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list).post(events::create))
        .route("/reorder", post(events::reorder))
        .route("/{id}", get(events::get).put(events::update).delete(events::delete))
        .route("/{id}/move", post(events::move_event))
}
