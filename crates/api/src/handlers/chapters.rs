//! Handlers for chapters and the chapter writing assistant.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use storybible_core::choices::validate_required;
use storybible_core::error::CoreError;
use storybible_core::text::count_words;
use storybible_core::types::DbId;
use storybible_db::models::chapter::{Chapter, CreateChapter, UpdateChapter};
use storybible_db::repositories::{BookRepo, ChapterRepo};
use storybible_events::bus::MODEL_CHAPTER;
use storybible_events::ActivityEvent;
use storybible_pipeline::assist::{chapter_assist, AssistReply, AssistRequest};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 255;

#[derive(Debug, Serialize)]
pub struct NextNumber {
    pub next_number: i32,
}

fn validate_number(number: Option<i32>) -> Result<(), CoreError> {
    if number.is_some_and(|n| n < 1) {
        return Err(CoreError::Validation("chapter_number must be at least 1".into()));
    }
    Ok(())
}

async fn require_book(state: &AppState, user_id: DbId, book_id: DbId) -> AppResult<()> {
    BookRepo::find_by_id(&state.pool, user_id, book_id)
        .await?
        .ok_or_else(|| AppError::not_found("book", book_id))?;
    Ok(())
}

/// GET /api/v1/books/{book_id}/chapters
pub async fn list_by_book(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Chapter>>>> {
    require_book(&state, auth.user_id, book_id).await?;
    let chapters = ChapterRepo::list_by_book(&state.pool, book_id).await?;
    Ok(Json(DataResponse::new(chapters)))
}

/// GET /api/v1/books/{book_id}/chapters/next-number
pub async fn next_number(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<DbId>,
) -> AppResult<Json<DataResponse<NextNumber>>> {
    require_book(&state, auth.user_id, book_id).await?;
    let next_number = ChapterRepo::next_number(&state.pool, book_id).await?;
    Ok(Json(DataResponse::new(NextNumber { next_number })))
}

/// POST /api/v1/books/{book_id}/chapters
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<DbId>,
    Json(input): Json<CreateChapter>,
) -> AppResult<impl IntoResponse> {
    validate_required("title", &input.title, MAX_TITLE_LEN)?;
    validate_number(input.chapter_number)?;
    require_book(&state, auth.user_id, book_id).await?;

    let word_count = input.content.as_deref().map_or(0, count_words);
    let chapter = ChapterRepo::create(&state.pool, book_id, &input, word_count).await?;
    BookRepo::recompute_word_count(&state.pool, book_id).await?;

    tracing::info!(chapter_id = chapter.id, book_id, "Chapter created");
    state
        .event_bus
        .publish(ActivityEvent::created(auth.user_id, MODEL_CHAPTER, &chapter.title));
    Ok((StatusCode::CREATED, Json(DataResponse::new(chapter))))
}

/// GET /api/v1/chapters/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Chapter>>> {
    let chapter = ChapterRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("chapter", id))?;
    Ok(Json(DataResponse::new(chapter)))
}

/// PUT /api/v1/chapters/{id}
///
/// Changing `content` recomputes the chapter and book word counts.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateChapter>,
) -> AppResult<Json<DataResponse<Chapter>>> {
    if let Some(title) = &input.title {
        validate_required("title", title, MAX_TITLE_LEN)?;
    }
    validate_number(input.chapter_number)?;

    let word_count = input.content.as_deref().map(count_words);
    let chapter = ChapterRepo::update(&state.pool, auth.user_id, id, &input, word_count)
        .await?
        .ok_or_else(|| AppError::not_found("chapter", id))?;
    if word_count.is_some() {
        BookRepo::recompute_word_count(&state.pool, chapter.book_id).await?;
    }

    state
        .event_bus
        .publish(ActivityEvent::updated(auth.user_id, MODEL_CHAPTER, &chapter.title));
    Ok(Json(DataResponse::new(chapter)))
}

/// DELETE /api/v1/chapters/{id}
///
/// The chapter's events are deleted with it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let chapter = ChapterRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("chapter", id))?;
    ChapterRepo::delete(&state.pool, auth.user_id, id).await?;
    BookRepo::recompute_word_count(&state.pool, chapter.book_id).await?;

    state
        .event_bus
        .publish(ActivityEvent::deleted(auth.user_id, MODEL_CHAPTER, &chapter.title));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/chapters/{id}/assist
pub async fn assist(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssistRequest>,
) -> AppResult<Json<DataResponse<AssistReply>>> {
    let reply = chapter_assist(&state.pool, state.llm.as_ref(), auth.user_id, id, &input).await?;
    tracing::debug!(chapter_id = id, chars = reply.suggestion.len(), "Chapter assist answered");
    Ok(Json(DataResponse::new(reply)))
}
