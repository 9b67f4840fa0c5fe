//! Handlers for `/world-entries`.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use storybible_core::choices::{validate_choice, validate_required, WORLD_CATEGORIES};
use storybible_core::error::CoreError;
use storybible_core::types::DbId;
use storybible_db::models::world_entry::{CreateWorldEntry, UpdateWorldEntry, WorldEntry, WorldEntryFilter};
use storybible_db::repositories::{BookRepo, WorldEntryRepo};

use crate::error::{AppError, AppResult};
use crate::media::{remove_image, store_image, ImageTarget, UploadForm};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;

async fn validate(
    state: &AppState,
    user_id: DbId,
    title: Option<&str>,
    category: Option<&str>,
    book_id: Option<DbId>,
) -> AppResult<()> {
    if let Some(title) = title {
        validate_required("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(category) = category {
        validate_choice("category", WORLD_CATEGORIES, category)?;
    }
    if let Some(book_id) = book_id {
        if BookRepo::find_by_id(&state.pool, user_id, book_id).await?.is_none() {
            return Err(CoreError::Validation(format!("Unknown book_id {book_id}")).into());
        }
    }
    Ok(())
}

async fn load(state: &AppState, user_id: DbId, id: DbId) -> AppResult<WorldEntry> {
    WorldEntryRepo::find_by_id(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("world entry", id))
}

/// GET /api/v1/world-entries
///
/// Query filters: `category`, `book_id`.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<WorldEntryFilter>,
) -> AppResult<Json<DataResponse<Vec<WorldEntry>>>> {
    let entries = WorldEntryRepo::list(&state.pool, auth.user_id, &filter).await?;
    Ok(Json(DataResponse::new(entries)))
}

/// POST /api/v1/world-entries
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateWorldEntry>,
) -> AppResult<impl IntoResponse> {
    validate(&state, auth.user_id, Some(&input.title), input.category.as_deref(), input.book_id).await?;
    let entry = WorldEntryRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(world_entry_id = entry.id, user_id = auth.user_id, "World entry created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(entry))))
}

/// GET /api/v1/world-entries/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WorldEntry>>> {
    Ok(Json(DataResponse::new(load(&state, auth.user_id, id).await?)))
}

/// PUT /api/v1/world-entries/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateWorldEntry>,
) -> AppResult<Json<DataResponse<WorldEntry>>> {
    validate(
        &state,
        auth.user_id,
        input.title.as_deref(),
        input.category.as_deref(),
        input.book_id,
    )
    .await?;
    let entry = WorldEntryRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("world entry", id))?;
    Ok(Json(DataResponse::new(entry)))
}

/// DELETE /api/v1/world-entries/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let entry = load(&state, auth.user_id, id).await?;
    WorldEntryRepo::delete(&state.pool, auth.user_id, id).await?;
    remove_image(&state.config.media_root, entry.image_path.as_deref()).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/world-entries/{id}/image
pub async fn upload_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<WorldEntry>>> {
    let entry = load(&state, auth.user_id, id).await?;
    let (_, bytes) = UploadForm::read(multipart).await?.take_file()?;

    let path = store_image(&state.config.media_root, ImageTarget::WorldImage, id, bytes).await?;
    WorldEntryRepo::set_image(&state.pool, id, &path).await?;
    remove_image(&state.config.media_root, entry.image_path.as_deref()).await;

    Ok(Json(DataResponse::new(load(&state, auth.user_id, id).await?)))
}
