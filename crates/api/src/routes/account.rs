use axum::routing::get;
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// Routes mounted at `/account`.
///
/// ```text
/// GET  /  -> get
/// PUT  /  -> update
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(account::get).put(account::update))
}
