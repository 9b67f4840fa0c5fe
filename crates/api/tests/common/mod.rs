//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use storybible_api::config::ServerConfig;
use storybible_api::engine::JobRunner;
use storybible_api::router::build_app_router;
use storybible_api::state::AppState;
use storybible_events::EventBus;
use storybible_llm::mock::ScriptedLlm;
use storybible_llm::LlmClient;
use storybible_pipeline::PipelineContext;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// Test config: fixed JWT secret, media under `media_root`, no LLM key.
pub fn test_config(media_root: &std::path::Path) -> ServerConfig {
    let media = media_root.to_string_lossy().to_string();
    ServerConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret".to_string()),
        "REQUEST_TIMEOUT_SECS" => Some("30".to_string()),
        "MEDIA_ROOT" => Some(media.clone()),
        _ => None,
    })
}

/// A running app plus the handles tests need to poke at.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub llm: Arc<ScriptedLlm>,
    _media: TempDir,
}

impl TestApp {
    /// A fresh router clone for one `oneshot` request.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Wait for every queued import and deep-scan job.
    pub async fn drain_jobs(&self) {
        self.state.jobs.drain().await;
    }
}

/// App whose model never answers.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, ScriptedLlm::new(Vec::new()))
}

/// App answering model calls from `llm`, in order.
pub fn build_test_app_with(pool: PgPool, llm: ScriptedLlm) -> TestApp {
    let media = tempfile::tempdir().unwrap();
    let config = test_config(media.path());
    let llm = Arc::new(llm);
    let client: Arc<dyn LlmClient> = llm.clone();

    let ctx = PipelineContext::new(pool.clone(), client.clone(), CancellationToken::new());
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        llm: client,
        event_bus: Arc::new(EventBus::default()),
        jobs: JobRunner::new(ctx, config.max_concurrent_jobs),
    };
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        llm,
        _media: media,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, request(Method::POST, uri, None, Some(&body))).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, request(Method::POST, uri, Some(token), Some(&body))).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, request(Method::PUT, uri, Some(token), Some(&body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// POST a multipart form with text `fields` and an optional `file` part.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Response {
    const BOUNDARY: &str = "storybible-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Assert `status` and return the `data` envelope contents.
pub async fn expect_data(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A registered user's tokens.
pub struct Session {
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn register(app: &TestApp, username: &str) -> Session {
    let response = post_json(
        app.router(),
        "/api/v1/auth/register",
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "first_name": "Test",
            "last_name": "Writer",
            "password": PASSWORD,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    Session {
        user_id: body["user"]["id"].as_i64().unwrap(),
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Create a book and return its id.
pub async fn create_book(app: &TestApp, token: &str, title: &str) -> i64 {
    let response = post_json_auth(app.router(), "/api/v1/books", token, json!({ "title": title })).await;
    expect_data(response, StatusCode::CREATED).await["id"].as_i64().unwrap()
}

pub async fn create_character(app: &TestApp, token: &str, name: &str) -> i64 {
    let response = post_json_auth(app.router(), "/api/v1/characters", token, json!({ "name": name })).await;
    expect_data(response, StatusCode::CREATED).await["id"].as_i64().unwrap()
}

pub async fn create_event(app: &TestApp, token: &str, body: Value) -> Value {
    let response = post_json_auth(app.router(), "/api/v1/events", token, body).await;
    expect_data(response, StatusCode::CREATED).await
}
