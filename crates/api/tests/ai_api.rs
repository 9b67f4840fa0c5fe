//! Integration tests for the model-backed endpoints and background jobs.
//!
//! The model is a scripted stand-in: replies are consumed in order and
//! every further call fails.

mod common;

use axum::http::StatusCode;
use common::{
    create_book, create_character, create_event, expect_data, get_auth, post_json_auth, post_multipart_auth, register,
};
use serde_json::json;
use sqlx::PgPool;
use storybible_core::focus::FOCUS_TASK_COUNT;
use storybible_llm::mock::ScriptedLlm;

const MANUSCRIPT: &str = "Chapter 1: The Beginning\n\
It began on a Tuesday, in the rain.\n\n\
Chapter 2: The Middle\n\
Then the rain stopped and nobody noticed.\n";

// ---------------------------------------------------------------------------
// Consultant and chapter assistant
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn consultant_answers_with_story_context(pool: PgPool) {
    let app = common::build_test_app_with(pool, ScriptedLlm::with_replies(["  Raise the stakes.  "]));
    let token = register(&app, "ada").await.access_token;
    create_character(&app, &token, "Paul").await;

    let answer = expect_data(
        post_json_auth(
            app.router(),
            "/api/v1/ai/consultant",
            &token,
            json!({ "query": "What does Paul want?" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(answer["answer"], "Raise the stakes.");
    assert!(answer["context_used"].as_str().unwrap().contains("Paul"));
    assert_eq!(app.llm.call_count(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn consultant_rejects_blank_query_without_calling_the_model(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let response = post_json_auth(app.router(), "/api/v1/ai/consultant", &token, json!({ "query": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.llm.call_count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn chapter_assist_returns_suggestion_and_prompt(pool: PgPool) {
    let app = common::build_test_app_with(pool, ScriptedLlm::with_replies(["The storm broke."]));
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;
    let chapter = expect_data(
        post_json_auth(
            app.router(),
            &format!("/api/v1/books/{book}/chapters"),
            &token,
            json!({ "title": "Storm" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let reply = expect_data(
        post_json_auth(
            app.router(),
            &format!("/api/v1/chapters/{}/assist", chapter["id"]),
            &token,
            json!({ "current_text": "The sky darkened.", "instruction": "Continue" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(reply["suggestion"], "The storm broke.");
    assert!(reply["prompt"].as_str().unwrap().contains("The sky darkened."));
}

// ---------------------------------------------------------------------------
// Focus tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn focus_tasks_fall_back_to_defaults_and_persist_for_the_day(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let tasks = expect_data(get_auth(app.router(), "/api/v1/ai/focus-tasks", &token).await, StatusCode::OK).await;
    let tasks = tasks.as_array().unwrap().clone();
    assert_eq!(tasks.len(), FOCUS_TASK_COUNT);
    assert!(tasks.iter().all(|t| t["is_completed"] == false));

    // Generated once per day.
    let again = expect_data(get_auth(app.router(), "/api/v1/ai/focus-tasks", &token).await, StatusCode::OK).await;
    assert_eq!(again.as_array().unwrap().len(), FOCUS_TASK_COUNT);
    assert_eq!(app.llm.call_count(), 1);

    let id = tasks[0]["id"].as_i64().unwrap();
    let done = expect_data(
        post_json_auth(
            app.router(),
            &format!("/api/v1/ai/focus-tasks/{id}/complete"),
            &token,
            json!({}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(done["is_completed"], true);

    let other = register(&app, "mallory").await.access_token;
    let response = post_json_auth(
        app.router(),
        &format!("/api/v1/ai/focus-tasks/{id}/complete"),
        &other,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn focus_tasks_use_model_suggestions(pool: PgPool) {
    let reply = json!({ "tasks": ["Outline act two", "Name the villain", "Draft the heist"] }).to_string();
    let app = common::build_test_app_with(pool, ScriptedLlm::with_replies([reply]));
    let token = register(&app, "ada").await.access_token;

    let tasks = expect_data(get_auth(app.router(), "/api/v1/ai/focus-tasks", &token).await, StatusCode::OK).await;
    let texts: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["task_text"].as_str().unwrap())
        .collect();
    assert!(texts.contains(&"Outline act two"));
}

// ---------------------------------------------------------------------------
// Relationship analysis
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn analysis_needs_a_shared_scene(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;
    let paul = create_character(&app, &token, "Paul").await;
    let chani = create_character(&app, &token, "Chani").await;
    create_event(&app, &token, json!({ "title": "Alone", "book_id": book, "character_ids": [paul] })).await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/relationships/analyze",
        &token,
        json!({ "character_a_id": paul, "character_b_id": chani, "book_id": book }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.llm.call_count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sync_from_empty_cache_changes_nothing(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let synced = expect_data(
        post_json_auth(app.router(), "/api/v1/relationships/sync-from-cache", &token, json!({})).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(synced["synced"], 0);
}

// ---------------------------------------------------------------------------
// Manuscript import and deep scan
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_creates_book_and_chapters_in_the_background(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let response = post_multipart_auth(
        app.router(),
        "/api/v1/books/import",
        &token,
        &[("title", "Rainfall")],
        Some(("rainfall.txt", MANUSCRIPT.as_bytes())),
    )
    .await;
    let queued = expect_data(response, StatusCode::ACCEPTED).await;
    assert_eq!(queued["status"], "importing");
    let book = queued["id"].as_i64().unwrap();

    app.drain_jobs().await;

    let status = expect_data(
        get_auth(app.router(), &format!("/api/v1/books/{book}/import-status"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(status["status"], "drafting");
    assert_eq!(status["import_progress"], 100);
    assert!(status["import_status_message"]
        .as_str()
        .unwrap()
        .starts_with("Import complete: 2 chapters"));

    let chapters = expect_data(
        get_auth(app.router(), &format!("/api/v1/books/{book}/chapters"), &token).await,
        StatusCode::OK,
    )
    .await;
    let chapters = chapters.as_array().unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0]["chapter_number"], 1);
    assert_eq!(chapters[0]["title"], "The Beginning");
    assert!(chapters[1]["content"].as_str().unwrap().contains("rain stopped"));

    let row = expect_data(
        get_auth(app.router(), &format!("/api/v1/books/{book}"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert!(row["current_word_count"].as_i64().unwrap() > 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_rejects_missing_title_and_unknown_formats(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let response = post_multipart_auth(
        app.router(),
        "/api/v1/books/import",
        &token,
        &[],
        Some(("rainfall.txt", MANUSCRIPT.as_bytes())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_multipart_auth(
        app.router(),
        "/api/v1/books/import",
        &token,
        &[("title", "Rainfall")],
        Some(("rainfall.exe", b"MZ")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let books = expect_data(get_auth(app.router(), "/api/v1/books", &token).await, StatusCode::OK).await;
    assert!(books.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deep_scan_reports_completion_without_touching_status(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;

    let response = post_json_auth(app.router(), &format!("/api/v1/books/{book}/deep-scan"), &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    app.drain_jobs().await;

    let status = expect_data(
        get_auth(app.router(), &format!("/api/v1/books/{book}/import-status"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(status["status"], "planning");
    assert_eq!(status["import_progress"], 100);
    assert!(status["import_status_message"]
        .as_str()
        .unwrap()
        .starts_with("Deep scan complete"));
}
