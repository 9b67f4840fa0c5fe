use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Overview routes mounted at the API root.
///
/// ```text
/// GET /dashboard -> dashboard
/// GET /activity  -> activity (?limit=&offset=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/activity", get(dashboard::activity))
}
