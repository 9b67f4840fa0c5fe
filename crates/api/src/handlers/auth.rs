//! Handlers for `/auth`: register, login, refresh and logout.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use storybible_core::error::CoreError;
use storybible_db::models::session::NewSession;
use storybible_db::models::user::{CreateUser, User, UserResponse};
use storybible_db::repositories::{SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Consecutive failures before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;
const LOCK_DURATION_MINS: i64 = 15;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3 to 150 characters"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logging out with a refresh token ends that session only; without one
/// every session of the user ends.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid username or password".into()))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.chars().take(255).collect())
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    let username = input.username.trim();
    validate_password(&input.password, username)?;

    let password_hash =
        hash_password(&input.password).map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: username.to_string(),
            email: input.email.trim().to_lowercase(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            password_hash,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let response = issue_tokens(&state, &user, user_agent(&headers)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden("Account is deactivated".into())));
    }
    if user.locked_until.is_some_and(|until| until > Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if user.failed_login_count + 1 >= MAX_FAILED_ATTEMPTS {
            let until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, until).await?;
            tracing::warn!(user_id = user.id, "Account locked after repeated failed logins");
        }
        return Err(invalid_credentials());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    Ok(Json(issue_tokens(&state, &user, user_agent(&headers)).await?))
}

/// POST /api/v1/auth/refresh
///
/// Rotates the refresh token: the presented one stops working.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let expired = || AppError::Core(CoreError::Unauthorized("Invalid or expired refresh token".into()));

    let session = SessionRepo::find_active(&state.pool, &hash_refresh_token(&input.refresh_token))
        .await?
        .ok_or_else(expired)?;
    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden("Account is deactivated".into())));
    }

    let (refresh_token, refresh_hash) = generate_refresh_token();
    let next = new_session(&state, &user, refresh_hash, user_agent(&headers));
    SessionRepo::rotate(&state.pool, session.id, &next)
        .await?
        .ok_or_else(expired)?;

    Ok(Json(auth_response(&state, &user, refresh_token)?))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<LogoutRequest>>,
) -> AppResult<StatusCode> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    match request.refresh_token {
        Some(token) => {
            SessionRepo::revoke_by_token_hash(&state.pool, auth.user_id, &hash_refresh_token(&token)).await?;
        }
        None => {
            SessionRepo::revoke_all_for_user(&state.pool, auth.user_id).await?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

fn new_session(state: &AppState, user: &User, refresh_token_hash: String, user_agent: Option<String>) -> NewSession {
    NewSession {
        user_id: user.id,
        refresh_token_hash,
        expires_at: Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days),
        user_agent,
    }
}

fn auth_response(state: &AppState, user: &User, refresh_token: String) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, &user.username, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: state.config.jwt.access_token_ttl_secs(),
        user: UserResponse::from(user),
    })
}

/// Open a session and build the token pair.
async fn issue_tokens(state: &AppState, user: &User, user_agent: Option<String>) -> AppResult<AuthResponse> {
    let (refresh_token, refresh_hash) = generate_refresh_token();
    SessionRepo::create(&state.pool, &new_session(state, user, refresh_hash, user_agent)).await?;
    auth_response(state, user, refresh_token)
}
