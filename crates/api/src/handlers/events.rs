//! Handlers for `/events`: the scene timeline.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use storybible_core::choices::{
    validate_choice, validate_required, validate_score, EMOTIONAL_TONES, STORY_BEATS,
};
use storybible_core::error::CoreError;
use storybible_core::text::{count_words, strip_html};
use storybible_core::types::DbId;
use storybible_db::models::event::{CreateEvent, EventFilter, EventWithLinks, UpdateEvent};
use storybible_db::repositories::{BookRepo, ChapterRepo, CharacterRepo, EventRepo, MoveDirection};
use storybible_events::bus::MODEL_EVENT;
use storybible_events::ActivityEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 255;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub event_id: DbId,
    pub new_order: i32,
}

struct EventFields<'a> {
    title: Option<&'a str>,
    emotional_tone: Option<&'a str>,
    story_beat: Option<&'a str>,
    tension_level: Option<i32>,
    sequence_order: Option<i32>,
    chapter_id: Option<DbId>,
    pov_character_id: Option<DbId>,
}

/// Validate vocabulary fields and that referenced rows belong to the user.
///
/// A chapter must be part of `book_id`.
async fn validate_fields(state: &AppState, user_id: DbId, book_id: DbId, f: EventFields<'_>) -> AppResult<()> {
    if let Some(title) = f.title {
        validate_required("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(tone) = f.emotional_tone {
        validate_choice("emotional_tone", EMOTIONAL_TONES, tone)?;
    }
    if let Some(beat) = f.story_beat {
        validate_choice("story_beat", STORY_BEATS, beat)?;
    }
    if let Some(level) = f.tension_level {
        validate_score("tension_level", level)?;
    }
    if let Some(order) = f.sequence_order {
        validate_sequence_order("sequence_order", order)?;
    }
    if let Some(chapter_id) = f.chapter_id {
        let chapter = ChapterRepo::find_by_id(&state.pool, user_id, chapter_id).await?;
        if chapter.is_none_or(|c| c.book_id != book_id) {
            return Err(CoreError::Validation(format!("Chapter {chapter_id} is not part of book {book_id}")).into());
        }
    }
    if let Some(pov) = f.pov_character_id {
        if CharacterRepo::find_by_id(&state.pool, user_id, pov).await?.is_none() {
            return Err(CoreError::Validation(format!("Unknown pov_character_id {pov}")).into());
        }
    }
    Ok(())
}

/// Timeline positions start at 1.
fn validate_sequence_order(field: &str, order: i32) -> Result<(), CoreError> {
    if order < 1 {
        return Err(CoreError::Validation(format!("{field} must be at least 1")));
    }
    Ok(())
}

/// Word count of rich-text content, falling back to an explicit count.
fn word_count(content_html: Option<&str>, explicit: Option<i32>) -> Option<i32> {
    match content_html {
        Some(html) if !html.trim().is_empty() => Some(count_words(&strip_html(html))),
        _ => explicit.map(|n| n.max(0)),
    }
}

async fn load(state: &AppState, user_id: DbId, id: DbId) -> AppResult<EventWithLinks> {
    EventRepo::find_with_links(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("event", id))
}

/// GET /api/v1/events
///
/// Query filters: `book_id`, `chapter_id`, `character_id` (linked or POV),
/// `tag_id`.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> AppResult<Json<DataResponse<Vec<EventWithLinks>>>> {
    let events = EventRepo::list(&state.pool, auth.user_id, &filter).await?;
    let events = EventRepo::attach_links(&state.pool, events).await?;
    Ok(Json(DataResponse::new(events)))
}

/// POST /api/v1/events
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEvent>,
) -> AppResult<impl IntoResponse> {
    BookRepo::find_by_id(&state.pool, auth.user_id, input.book_id)
        .await?
        .ok_or_else(|| CoreError::Validation(format!("Unknown book_id {}", input.book_id)))?;
    validate_fields(
        &state,
        auth.user_id,
        input.book_id,
        EventFields {
            title: Some(&input.title),
            emotional_tone: input.emotional_tone.as_deref(),
            story_beat: input.story_beat.as_deref(),
            tension_level: input.tension_level,
            sequence_order: input.sequence_order,
            chapter_id: input.chapter_id,
            pov_character_id: input.pov_character_id,
        },
    )
    .await?;

    let words = word_count(input.content_html.as_deref(), input.word_count).unwrap_or(0);
    let event = EventRepo::create(&state.pool, auth.user_id, &input, words).await?;
    BookRepo::recompute_word_count(&state.pool, event.book_id).await?;

    tracing::info!(event_id = event.id, book_id = event.book_id, "Event created");
    state
        .event_bus
        .publish(ActivityEvent::created(auth.user_id, MODEL_EVENT, &event.title));
    let event = load(&state, auth.user_id, event.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(event))))
}

/// GET /api/v1/events/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EventWithLinks>>> {
    Ok(Json(DataResponse::new(load(&state, auth.user_id, id).await?)))
}

/// PUT /api/v1/events/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvent>,
) -> AppResult<Json<DataResponse<EventWithLinks>>> {
    let current = load(&state, auth.user_id, id).await?;
    validate_fields(
        &state,
        auth.user_id,
        current.event.book_id,
        EventFields {
            title: input.title.as_deref(),
            emotional_tone: input.emotional_tone.as_deref(),
            story_beat: input.story_beat.as_deref(),
            tension_level: input.tension_level,
            sequence_order: input.sequence_order,
            chapter_id: input.chapter_id.flatten(),
            pov_character_id: input.pov_character_id.flatten(),
        },
    )
    .await?;

    let words = word_count(input.content_html.as_deref(), input.word_count);
    let event = EventRepo::update(&state.pool, auth.user_id, id, &input, words)
        .await?
        .ok_or_else(|| AppError::not_found("event", id))?;
    if words.is_some() {
        BookRepo::recompute_word_count(&state.pool, event.book_id).await?;
    }

    state
        .event_bus
        .publish(ActivityEvent::updated(auth.user_id, MODEL_EVENT, &event.title));
    Ok(Json(DataResponse::new(load(&state, auth.user_id, id).await?)))
}

/// DELETE /api/v1/events/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let event = EventRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("event", id))?;
    EventRepo::delete(&state.pool, auth.user_id, id).await?;
    BookRepo::recompute_word_count(&state.pool, event.book_id).await?;

    state
        .event_bus
        .publish(ActivityEvent::deleted(auth.user_id, MODEL_EVENT, &event.title));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/events/{id}/move
pub async fn move_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveRequest>,
) -> AppResult<Json<DataResponse<EventWithLinks>>> {
    EventRepo::move_step(&state.pool, auth.user_id, id, input.direction.into())
        .await?
        .ok_or_else(|| AppError::not_found("event", id))?;
    Ok(Json(DataResponse::new(load(&state, auth.user_id, id).await?)))
}

/// POST /api/v1/events/reorder
pub async fn reorder(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<Json<DataResponse<EventWithLinks>>> {
    validate_sequence_order("new_order", input.new_order)?;
    EventRepo::set_sequence_order(&state.pool, auth.user_id, input.event_id, input.new_order)
        .await?
        .ok_or_else(|| AppError::not_found("event", input.event_id))?;
    Ok(Json(DataResponse::new(load(&state, auth.user_id, input.event_id).await?)))
}
