//! Handlers for `/ai`: the story consultant and daily focus tasks.

use axum::extract::{Path, State};
use axum::Json;
use storybible_core::types::DbId;
use storybible_db::models::focus_task::FocusTask;
use storybible_db::repositories::FocusTaskRepo;
use storybible_pipeline::assist::{consult, todays_focus_tasks, ConsultAnswer, ConsultRequest};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/ai/consultant
pub async fn consultant(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ConsultRequest>,
) -> AppResult<Json<DataResponse<ConsultAnswer>>> {
    let answer = consult(&state.pool, state.llm.as_ref(), auth.user_id, &input).await?;
    Ok(Json(DataResponse::new(answer)))
}

/// GET /api/v1/ai/focus-tasks
///
/// The first request of the day generates the day's tasks.
pub async fn focus_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<FocusTask>>>> {
    let tasks = todays_focus_tasks(&state.pool, state.llm.as_ref(), auth.user_id).await?;
    Ok(Json(DataResponse::new(tasks)))
}

/// POST /api/v1/ai/focus-tasks/{id}/complete
pub async fn complete_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FocusTask>>> {
    let task = FocusTaskRepo::complete(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("focus task", id))?;
    Ok(Json(DataResponse::new(task)))
}
