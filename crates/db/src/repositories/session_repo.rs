//! Refresh-token session storage.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::session::{NewSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, revoked_at, user_agent, created_at";

/// Revoked sessions are kept this long before cleanup deletes them.
const REVOKED_RETENTION: &str = "1 day";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(pool: &PgPool, input: &NewSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// A live session (not revoked, not expired) for this token hash.
    pub async fn find_active(pool: &PgPool, token_hash: &str) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE refresh_token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Swap a refresh token for a new one in a single transaction.
    ///
    /// Returns `None` when the old session was already revoked, so a token
    /// replayed concurrently only rotates once.
    pub async fn rotate(
        pool: &PgPool,
        old_session_id: DbId,
        next: &NewSession,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let revoked = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(old_session_id)
        .bind(next.user_id)
        .execute(&mut *tx)
        .await?;
        if revoked.rows_affected() == 0 {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, UserSession>(&query)
            .bind(next.user_id)
            .bind(&next.refresh_token_hash)
            .bind(next.expires_at)
            .bind(&next.user_agent)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(session))
    }

    /// Log out one device. Returns `false` if no live session of `user_id`
    /// holds the token.
    pub async fn revoke_by_token_hash(pool: &PgPool, user_id: DbId, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE refresh_token_hash = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Log out everywhere, e.g. after a password change.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE user_sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired sessions and sessions revoked more than a day ago.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let query = format!(
            "DELETE FROM user_sessions
             WHERE expires_at < NOW() OR revoked_at < NOW() - INTERVAL '{REVOKED_RETENTION}'"
        );
        let result = sqlx::query(&query).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
