use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ai;
use crate::state::AppState;

/// Routes mounted at `/ai`.
///
/// ```text
/// POST /consultant                 -> consultant
/// GET  /focus-tasks                -> focus_tasks
/// POST /focus-tasks/{id}/complete  -> complete_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/consultant", post(ai::consultant))
        .route("/focus-tasks", get(ai::focus_tasks))
        .route("/focus-tasks/{id}/complete", post(ai::complete_task))
}
