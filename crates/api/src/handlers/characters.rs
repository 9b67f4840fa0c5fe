//! Handlers for `/characters`.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use storybible_core::choices::{validate_choice, validate_hex_color, validate_required, CHARACTER_ROLES};
use storybible_core::error::CoreError;
use storybible_core::types::DbId;
use storybible_db::models::character::{Character, CreateCharacter, UpdateCharacter};
use storybible_db::repositories::{BookRepo, ChapterRepo, CharacterRepo};
use storybible_events::bus::MODEL_CHARACTER;
use storybible_events::ActivityEvent;

use crate::error::{AppError, AppResult};
use crate::media::{remove_image, store_image, ImageTarget, UploadForm};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 200;

struct CharacterFields<'a> {
    name: Option<&'a str>,
    role: Option<&'a str>,
    color_code: Option<&'a str>,
    introduction_book_id: Option<DbId>,
    introduction_chapter_id: Option<DbId>,
}

impl<'a> From<&'a CreateCharacter> for CharacterFields<'a> {
    fn from(c: &'a CreateCharacter) -> Self {
        Self {
            name: Some(&c.name),
            role: c.role.as_deref(),
            color_code: c.color_code.as_deref(),
            introduction_book_id: c.introduction_book_id,
            introduction_chapter_id: c.introduction_chapter_id,
        }
    }
}

impl<'a> From<&'a UpdateCharacter> for CharacterFields<'a> {
    fn from(c: &'a UpdateCharacter) -> Self {
        Self {
            name: c.name.as_deref(),
            role: c.role.as_deref(),
            color_code: c.color_code.as_deref(),
            introduction_book_id: c.introduction_book_id.flatten(),
            introduction_chapter_id: c.introduction_chapter_id.flatten(),
        }
    }
}

/// Check field values and that referenced books and chapters belong to the user.
async fn validate_fields(state: &AppState, user_id: DbId, fields: CharacterFields<'_>) -> AppResult<()> {
    if let Some(name) = fields.name {
        validate_required("name", name, MAX_NAME_LEN)?;
    }
    if let Some(role) = fields.role {
        validate_choice("role", CHARACTER_ROLES, role)?;
    }
    if let Some(color) = fields.color_code {
        validate_hex_color("color_code", color)?;
    }
    if let Some(book_id) = fields.introduction_book_id {
        if BookRepo::find_by_id(&state.pool, user_id, book_id).await?.is_none() {
            return Err(CoreError::Validation(format!("Unknown introduction_book_id {book_id}")).into());
        }
    }
    if let Some(chapter_id) = fields.introduction_chapter_id {
        if ChapterRepo::find_by_id(&state.pool, user_id, chapter_id).await?.is_none() {
            return Err(CoreError::Validation(format!("Unknown introduction_chapter_id {chapter_id}")).into());
        }
    }
    Ok(())
}

async fn load_character(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Character> {
    CharacterRepo::find_by_id(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("character", id))
}

/// GET /api/v1/characters
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Character>>>> {
    let characters = CharacterRepo::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(characters)))
}

/// POST /api/v1/characters
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCharacter>,
) -> AppResult<impl IntoResponse> {
    validate_fields(&state, auth.user_id, CharacterFields::from(&input)).await?;
    let character = CharacterRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(character_id = character.id, user_id = auth.user_id, "Character created");
    state
        .event_bus
        .publish(ActivityEvent::created(auth.user_id, MODEL_CHARACTER, &character.name));
    Ok((StatusCode::CREATED, Json(DataResponse::new(character))))
}

/// GET /api/v1/characters/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Character>>> {
    let character = load_character(&state, auth.user_id, id).await?;
    Ok(Json(DataResponse::new(character)))
}

/// PUT /api/v1/characters/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCharacter>,
) -> AppResult<Json<DataResponse<Character>>> {
    validate_fields(&state, auth.user_id, CharacterFields::from(&input)).await?;
    let character = CharacterRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("character", id))?;

    state
        .event_bus
        .publish(ActivityEvent::updated(auth.user_id, MODEL_CHARACTER, &character.name));
    Ok(Json(DataResponse::new(character)))
}

/// DELETE /api/v1/characters/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let character = load_character(&state, auth.user_id, id).await?;
    CharacterRepo::delete(&state.pool, auth.user_id, id).await?;
    remove_image(&state.config.media_root, character.profile_image_path.as_deref()).await;

    state
        .event_bus
        .publish(ActivityEvent::deleted(auth.user_id, MODEL_CHARACTER, &character.name));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/characters/{id}/profile-image
pub async fn upload_profile_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Character>>> {
    let character = load_character(&state, auth.user_id, id).await?;
    let (_, bytes) = UploadForm::read(multipart).await?.take_file()?;

    let path = store_image(&state.config.media_root, ImageTarget::CharacterProfile, id, bytes).await?;
    CharacterRepo::set_profile_image(&state.pool, id, &path).await?;
    remove_image(&state.config.media_root, character.profile_image_path.as_deref()).await;

    let character = load_character(&state, auth.user_id, id).await?;
    Ok(Json(DataResponse::new(character)))
}
