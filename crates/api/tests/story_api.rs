//! Integration tests for the story bible resources: books, chapters,
//! characters, events, tags, relationships and world entries.

mod common;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use common::{
    body_text, create_book, create_character, create_event, delete_auth, expect_data, get_auth, post_json_auth,
    put_json_auth, register,
};
use serde_json::{json, Value};
use sqlx::PgPool;

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Books and chapters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn book_crud_lifecycle(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let response = post_json_auth(
        app.router(),
        "/api/v1/books",
        &token,
        json!({ "title": "The Long Dark", "word_count_target": 1000 }),
    )
    .await;
    let book = expect_data(response, StatusCode::CREATED).await;
    let id = book["id"].as_i64().unwrap();
    assert_eq!(book["series_order"], 1);
    assert_eq!(book["progress_percentage"], 0);

    let second = create_book(&app, &token, "The Longer Dark").await;
    let list = expect_data(get_auth(app.router(), "/api/v1/books", &token).await, StatusCode::OK).await;
    assert_eq!(ids(&list), vec![id, second]);

    let response = put_json_auth(
        app.router(),
        &format!("/api/v1/books/{id}"),
        &token,
        json!({ "status": "editing", "description": "Winter falls." }),
    )
    .await;
    let updated = expect_data(response, StatusCode::OK).await;
    assert_eq!(updated["status"], "editing");
    assert_eq!(updated["title"], "The Long Dark");

    let response = delete_auth(app.router(), &format!("/api/v1/books/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get_auth(app.router(), &format!("/api/v1/books/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn chapters_number_themselves_and_drive_word_count(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;
    let chapters = format!("/api/v1/books/{book}/chapters");

    let next = expect_data(
        get_auth(app.router(), &format!("{chapters}/next-number"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(next["next_number"], 1);

    let first = expect_data(
        post_json_auth(
            app.router(),
            &chapters,
            &token,
            json!({ "title": "Arrakis", "content": "Sand everywhere and more sand" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(first["chapter_number"], 1);
    assert_eq!(first["word_count"], 5);

    let second = expect_data(
        post_json_auth(app.router(), &chapters, &token, json!({ "title": "Sietch", "content": "Water" })).await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(second["chapter_number"], 2);

    let book_row = expect_data(
        get_auth(app.router(), &format!("/api/v1/books/{book}"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(book_row["current_word_count"], 6);

    // Chapter numbers are unique within a book.
    let response = post_json_auth(
        app.router(),
        &chapters,
        &token,
        json!({ "title": "Again", "chapter_number": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let list = expect_data(get_auth(app.router(), &chapters, &token).await, StatusCode::OK).await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Ownership scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn rows_are_invisible_to_other_users(pool: PgPool) {
    let app = common::build_test_app(pool);
    let owner = register(&app, "ada").await.access_token;
    let intruder = register(&app, "mallory").await.access_token;

    let book = create_book(&app, &owner, "Private").await;
    let character = create_character(&app, &owner, "Secret").await;

    for uri in [format!("/api/v1/books/{book}"), format!("/api/v1/characters/{character}")] {
        let response = get_auth(app.router(), &uri, &intruder).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let response = delete_auth(app.router(), &uri, &intruder).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let list = expect_data(get_auth(app.router(), "/api/v1/books", &intruder).await, StatusCode::OK).await;
    assert!(list.as_array().unwrap().is_empty());

    // Writing into someone else's book is rejected.
    let response = post_json_auth(
        app.router(),
        "/api/v1/events",
        &intruder,
        json!({ "title": "Break-in", "book_id": book }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.router(),
        &format!("/api/v1/books/{book}/chapters"),
        &intruder,
        json!({ "title": "Break-in" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn character_validation_and_update(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;

    let response = post_json_auth(
        app.router(),
        "/api/v1/characters",
        &token,
        json!({ "name": "Paul", "role": "sidekick-ish" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let character = expect_data(
        post_json_auth(
            app.router(),
            "/api/v1/characters",
            &token,
            json!({ "name": "Paul", "role": "protagonist", "color_code": "#AA3300" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let id = character["id"].as_i64().unwrap();
    assert_eq!(character["role"], "protagonist");

    let updated = expect_data(
        put_json_auth(
            app.router(),
            &format!("/api/v1/characters/{id}"),
            &token,
            json!({ "nickname": "Usul", "aliases": "Muad'Dib" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["nickname"], "Usul");
    assert_eq!(updated["name"], "Paul");
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn events_are_sequenced_filtered_and_moved(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;
    let paul = create_character(&app, &token, "Paul").await;
    let jessica = create_character(&app, &token, "Jessica").await;

    let first = create_event(
        &app,
        &token,
        json!({ "title": "Gom jabbar", "book_id": book, "character_ids": [paul, jessica] }),
    )
    .await;
    let second = create_event(
        &app,
        &token,
        json!({
            "title": "Desert crossing",
            "book_id": book,
            "pov_character_id": jessica,
            "emotional_tone": "tension",
            "tension_level": 8,
            "content_html": "<p>Sand and wind</p>",
        }),
    )
    .await;
    let third = create_event(&app, &token, json!({ "title": "Arrival", "book_id": book })).await;

    assert_eq!(first["sequence_order"], 1);
    assert_eq!(second["sequence_order"], 2);
    assert_eq!(third["sequence_order"], 3);
    assert_eq!(second["word_count"], 3);
    let mut linked: Vec<i64> = first["character_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    linked.sort_unstable();
    assert_eq!(linked, {
        let mut expected = vec![paul, jessica];
        expected.sort_unstable();
        expected
    });

    // Jessica is linked to the first and narrates the second.
    let filtered = expect_data(
        get_auth(app.router(), &format!("/api/v1/events?character_id={jessica}"), &token).await,
        StatusCode::OK,
    )
    .await;
    let first_id = first["id"].as_i64().unwrap();
    let second_id = second["id"].as_i64().unwrap();
    let third_id = third["id"].as_i64().unwrap();
    assert_eq!(ids(&filtered), vec![first_id, second_id]);

    let moved = expect_data(
        post_json_auth(
            app.router(),
            &format!("/api/v1/events/{third_id}/move"),
            &token,
            json!({ "direction": "up" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(moved["sequence_order"], 2);

    let timeline = expect_data(
        get_auth(app.router(), &format!("/api/v1/events?book_id={book}"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ids(&timeline), vec![first_id, third_id, second_id]);

    let response = post_json_auth(
        app.router(),
        "/api/v1/events/reorder",
        &token,
        json!({ "event_id": first_id, "new_order": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn nullable_references_can_be_cleared(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;
    let jessica = create_character(&app, &token, "Jessica").await;
    let chapter = expect_data(
        post_json_auth(
            app.router(),
            &format!("/api/v1/books/{book}/chapters"),
            &token,
            json!({ "title": "Arrakis" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let event = create_event(
        &app,
        &token,
        json!({
            "title": "Desert crossing",
            "book_id": book,
            "chapter_id": chapter["id"],
            "pov_character_id": jessica,
        }),
    )
    .await;
    let uri = format!("/api/v1/events/{}", event["id"]);

    // Absent fields are kept.
    let kept = expect_data(
        put_json_auth(app.router(), &uri, &token, json!({ "title": "Crossing" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(kept["pov_character_id"], jessica);
    assert_eq!(kept["chapter_id"], chapter["id"]);

    // Explicit nulls clear.
    let cleared = expect_data(
        put_json_auth(
            app.router(),
            &uri,
            &token,
            json!({ "pov_character_id": null, "chapter_id": null }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert!(cleared["pov_character_id"].is_null());
    assert!(cleared["chapter_id"].is_null());
    assert_eq!(cleared["title"], "Crossing");

    let response = put_json_auth(app.router(), &uri, &token, json!({ "sequence_order": 0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let character_uri = format!("/api/v1/characters/{jessica}");
    let introduced = expect_data(
        put_json_auth(app.router(), &character_uri, &token, json!({ "introduction_book_id": book })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(introduced["introduction_book_id"], book);
    let cleared = expect_data(
        put_json_auth(app.router(), &character_uri, &token, json!({ "introduction_book_id": null })).await,
        StatusCode::OK,
    )
    .await;
    assert!(cleared["introduction_book_id"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn event_word_counts_roll_up_to_the_book(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;

    let event = create_event(
        &app,
        &token,
        json!({ "title": "Scene", "book_id": book, "content_html": "<p>one two three four</p>" }),
    )
    .await;
    let id = event["id"].as_i64().unwrap();

    let book_uri = format!("/api/v1/books/{book}");
    let row = expect_data(get_auth(app.router(), &book_uri, &token).await, StatusCode::OK).await;
    assert_eq!(row["current_word_count"], 4);

    let response = delete_auth(app.router(), &format!("/api/v1/events/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let row = expect_data(get_auth(app.router(), &book_uri, &token).await, StatusCode::OK).await;
    assert_eq!(row["current_word_count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn event_chapter_must_belong_to_the_book(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let dune = create_book(&app, &token, "Dune").await;
    let messiah = create_book(&app, &token, "Messiah").await;
    let chapter = expect_data(
        post_json_auth(
            app.router(),
            &format!("/api/v1/books/{messiah}/chapters"),
            &token,
            json!({ "title": "One" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/events",
        &token,
        json!({ "title": "Misfiled", "book_id": dune, "chapter_id": chapter["id"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn tags_filter_the_timeline(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;

    let tag = expect_data(
        post_json_auth(
            app.router(),
            "/api/v1/tags",
            &token,
            json!({ "name": "Prophecy", "category": "theme", "color": "#336699" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let tag_id = tag["id"].as_i64().unwrap();

    let tagged = create_event(&app, &token, json!({ "title": "Vision", "book_id": book, "tag_ids": [tag_id] })).await;
    create_event(&app, &token, json!({ "title": "Dinner", "book_id": book })).await;

    let filtered = expect_data(
        get_auth(app.router(), &format!("/api/v1/events?tag_id={tag_id}"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ids(&filtered), vec![tagged["id"].as_i64().unwrap()]);

    let renamed = expect_data(
        put_json_auth(app.router(), &format!("/api/v1/tags/{tag_id}"), &token, json!({ "name": "Visions" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(renamed["name"], "Visions");

    let response = delete_auth(app.router(), &format!("/api/v1/tags/{tag_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn relationship_pairs_are_normalised_and_unique(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let paul = create_character(&app, &token, "Paul").await;
    let chani = create_character(&app, &token, "Chani").await;

    let relationship = expect_data(
        post_json_auth(
            app.router(),
            "/api/v1/relationships",
            &token,
            json!({
                "character_a_id": chani,
                "character_b_id": paul,
                "relationship_type": "romantic",
                "character_a_wants": "a future",
                "character_b_wants": "to survive",
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(relationship["character_a_id"], paul);
    assert_eq!(relationship["character_b_id"], chani);
    assert_eq!(relationship["character_a_wants"], "to survive");
    assert_eq!(relationship["character_b_wants"], "a future");

    let response = post_json_auth(
        app.router(),
        "/api/v1/relationships",
        &token,
        json!({ "character_a_id": paul, "character_b_id": chani }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_auth(
        app.router(),
        "/api/v1/relationships",
        &token,
        json!({ "character_a_id": paul, "character_b_id": paul }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let graph = expect_data(
        get_auth(app.router(), "/api/v1/relationships/graph", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(graph["edges"][0]["source"], paul);
    assert_eq!(graph["edges"][0]["target"], chani);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn relationship_scores_are_bounded(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let paul = create_character(&app, &token, "Paul").await;
    let chani = create_character(&app, &token, "Chani").await;

    let response = post_json_auth(
        app.router(),
        "/api/v1/relationships",
        &token,
        json!({ "character_a_id": paul, "character_b_id": chani, "strength": 11 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// World entries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn world_entries_filter_by_category_and_book(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;

    let create = |body: Value| {
        let router = app.router();
        let token = token.clone();
        async move {
            let response = post_json_auth(router, "/api/v1/world-entries", &token, body).await;
            expect_data(response, StatusCode::CREATED).await
        }
    };
    let arrakis = create(json!({ "title": "Arrakis", "category": "location", "book_id": book })).await;
    create(json!({ "title": "Spice", "category": "lore" })).await;

    let locations = expect_data(
        get_auth(app.router(), "/api/v1/world-entries?category=location", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ids(&locations), vec![arrakis["id"].as_i64().unwrap()]);

    let in_book = expect_data(
        get_auth(app.router(), &format!("/api/v1/world-entries?book_id={book}"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(in_book.as_array().unwrap().len(), 1);

    let response = post_json_auth(
        app.router(),
        "/api/v1/world-entries",
        &token,
        json!({ "title": "Nowhere", "category": "dimension" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Dashboard and export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn dashboard_counts_books_and_events(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "Dune").await;
    create_character(&app, &token, "Paul").await;
    create_event(&app, &token, json!({ "title": "Written", "book_id": book, "is_written": true })).await;
    create_event(&app, &token, json!({ "title": "Planned", "book_id": book })).await;

    let dashboard = expect_data(get_auth(app.router(), "/api/v1/dashboard", &token).await, StatusCode::OK).await;
    assert_eq!(dashboard["books"][0]["id"], book);
    assert_eq!(dashboard["books"][0]["event_count"], 2);
    assert_eq!(dashboard["books"][0]["chapter_count"], 0);
    assert_eq!(dashboard["character_count"], 1);
    assert_eq!(dashboard["total_events"], 2);
    assert_eq!(dashboard["events_written"], 1);
    assert_eq!(dashboard["recent_events"].as_array().unwrap().len(), 2);

    let response = get_auth(app.router(), "/api/v1/activity?limit=5", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn export_renders_a_markdown_attachment(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = register(&app, "ada").await.access_token;
    let book = create_book(&app, &token, "The Long Dark").await;
    create_character(&app, &token, "Ranger").await;
    create_event(&app, &token, json!({ "title": "First snow", "book_id": book })).await;

    let response = get_auth(app.router(), &format!("/api/v1/books/{book}/export"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/markdown"));
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"the-long-dark-story-bible.md\""
    );

    let markdown = body_text(response).await;
    assert!(markdown.starts_with("# The Long Dark"));
    assert!(markdown.contains("First snow"));
}
