use axum::routing::{get, post};
use axum::Router;

use crate::handlers::characters;
use crate::state::AppState;

/// Routes mounted at `/characters`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{id}                -> get
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete
/// POST   /{id}/profile-image  -> upload_profile_image (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(characters::list).post(characters::create))
        .route(
            "/{id}",
            get(characters::get).put(characters::update).delete(characters::delete),
        )
        .route("/{id}/profile-image", post(characters::upload_profile_image))
}
