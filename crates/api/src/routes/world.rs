use axum::routing::{get, post};
use axum::Router;

use crate::handlers::world;
use crate::state::AppState;

/// Routes mounted at `/world-entries`.
///
/// ```text
/// GET    /            -> list (?category=&book_id=)
/// POST   /            -> create
/// GET    /{id}        -> get
/// PUT    /{id}        -> update
/// DELETE /{id}        -> delete
/// POST   /{id}/image  -> upload_image (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(world::list).post(world::create))
        .route("/{id}", get(world::get).put(world::update).delete(world::delete))
        .route("/{id}/image", post(world::upload_image))
}
