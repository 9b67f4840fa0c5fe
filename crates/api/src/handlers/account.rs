//! Handlers for `/account`: the signed-in user's own details.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use storybible_core::error::CoreError;
use storybible_db::models::user::{UpdateUser, User, UserResponse};
use storybible_db::repositories::{SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Changing the password requires the current one and ends every session.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AccountUpdate {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

async fn load_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user", auth.user_id))
}

/// GET /api/v1/account
pub async fn get(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(DataResponse::new(UserResponse::from(&user))))
}

/// PUT /api/v1/account
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<AccountUpdate>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    let user = load_user(&state, &auth).await?;

    if let Some(new_password) = input.new_password.as_deref() {
        let current = input.current_password.as_deref().unwrap_or_default();
        let valid = verify_password(current, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !valid {
            return Err(AppError::Core(CoreError::Validation("Current password is incorrect".into())));
        }
        validate_password(new_password, &user.username)?;
        let hash =
            hash_password(new_password).map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
        UserRepo::update_password(&state.pool, user.id, &hash).await?;
        let revoked = SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;
        tracing::info!(user_id = user.id, revoked, "Password changed");
    }

    let changes = UpdateUser {
        email: input.email.map(|e| e.trim().to_lowercase()),
        first_name: input.first_name.map(|s| s.trim().to_string()),
        last_name: input.last_name.map(|s| s.trim().to_string()),
    };
    let user = UserRepo::update(&state.pool, user.id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("user", auth.user_id))?;
    Ok(Json(DataResponse::new(UserResponse::from(&user))))
}
