use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use storybible_api::background;
use storybible_api::config::ServerConfig;
use storybible_api::engine::JobRunner;
use storybible_api::router::build_app_router;
use storybible_api::state::AppState;
use storybible_events::{ActivityRecorder, EventBus};
use storybible_pipeline::PipelineContext;

const DEFAULT_LOG_FILTER: &str = "storybible_api=debug,storybible_pipeline=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let fmt_layer = if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(fmt_layer)
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        llm_provider = ?config.llm.provider,
        max_jobs = config.max_concurrent_jobs,
        "Loaded server configuration"
    );
    if config.llm.api_key.is_none() {
        tracing::warn!("No LLM API key configured; AI features will be unavailable");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = storybible_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    storybible_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    storybible_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- LLM provider ---
    let llm = storybible_llm::build_client(&config.llm);

    // --- Activity feed ---
    let event_bus = Arc::new(EventBus::default());
    let recorder_handle = tokio::spawn(ActivityRecorder::run(pool.clone(), event_bus.subscribe()));

    // --- Background work ---
    let shutdown = CancellationToken::new();
    let jobs = JobRunner::new(
        PipelineContext::new(pool.clone(), Arc::clone(&llm), shutdown.child_token()),
        config.max_concurrent_jobs,
    );
    let cleanup_handle = tokio::spawn(background::session_cleanup::run(pool.clone(), shutdown.child_token()));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        llm,
        event_bus: Arc::clone(&event_bus),
        jobs: jobs.clone(),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    jobs.shutdown().await;
    tracing::info!("Background jobs stopped");

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;

    // The recorder exits once the last bus handle is gone.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), recorder_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
