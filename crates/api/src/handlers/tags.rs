//! Handlers for `/tags`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use storybible_core::choices::{validate_choice, validate_hex_color, validate_required, TAG_CATEGORIES};
use storybible_core::error::CoreError;
use storybible_core::types::DbId;
use storybible_db::models::tag::{CreateTag, Tag, UpdateTag};
use storybible_db::repositories::TagRepo;
use storybible_events::bus::MODEL_TAG;
use storybible_events::ActivityEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;

fn validate(name: Option<&str>, category: Option<&str>, color: Option<&str>) -> Result<(), CoreError> {
    if let Some(name) = name {
        validate_required("name", name, MAX_NAME_LEN)?;
    }
    if let Some(category) = category {
        validate_choice("category", TAG_CATEGORIES, category)?;
    }
    if let Some(color) = color {
        validate_hex_color("color", color)?;
    }
    Ok(())
}

/// GET /api/v1/tags
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Tag>>>> {
    let tags = TagRepo::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(tags)))
}

/// POST /api/v1/tags
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTag>,
) -> AppResult<impl IntoResponse> {
    validate(Some(&input.name), input.category.as_deref(), input.color.as_deref())?;
    let tag = TagRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(tag_id = tag.id, user_id = auth.user_id, "Tag created");
    state
        .event_bus
        .publish(ActivityEvent::created(auth.user_id, MODEL_TAG, &tag.name));
    Ok((StatusCode::CREATED, Json(DataResponse::new(tag))))
}

/// PUT /api/v1/tags/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<Json<DataResponse<Tag>>> {
    validate(input.name.as_deref(), input.category.as_deref(), input.color.as_deref())?;
    let tag = TagRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("tag", id))?;

    state
        .event_bus
        .publish(ActivityEvent::updated(auth.user_id, MODEL_TAG, &tag.name));
    Ok(Json(DataResponse::new(tag)))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let tag = TagRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("tag", id))?;
    TagRepo::delete(&state.pool, auth.user_id, id).await?;

    state
        .event_bus
        .publish(ActivityEvent::deleted(auth.user_id, MODEL_TAG, &tag.name));
    Ok(StatusCode::NO_CONTENT)
}
