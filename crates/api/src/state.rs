use std::sync::Arc;

use storybible_events::EventBus;
use storybible_llm::LlmClient;

use crate::config::ServerConfig;
use crate::engine::JobRunner;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: storybible_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub llm: Arc<dyn LlmClient>,
    /// Activity feed; handlers publish after every successful write.
    pub event_bus: Arc<EventBus>,
    pub jobs: JobRunner,
}
