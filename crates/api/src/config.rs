use std::path::PathBuf;

use storybible_llm::LlmConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Defaults suit local development; production overrides via the
/// environment (a `.env` file is honoured through `dotenvy`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Root directory for uploaded covers, profile and world images.
    pub media_root: PathBuf,
    /// Request body limit, applied to uploads too.
    pub max_upload_bytes: usize,
    /// Import and deep-scan jobs allowed to run at once.
    pub max_concurrent_jobs: usize,
    pub jwt: JwtConfig,
    pub llm: LlmConfig,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `MEDIA_ROOT`           | `media`                    |
    /// | `MAX_UPLOAD_BYTES`     | `20971520`                 |
    /// | `MAX_CONCURRENT_JOBS`  | `4`                        |
    ///
    /// JWT and LLM settings are read by [`JwtConfig`] and [`LlmConfig`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Panics
    ///
    /// Panics on unparseable numbers or a missing `JWT_SECRET`; a bad
    /// deployment should fail at startup, not on the first request.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = var("PORT", "3000").parse().expect("PORT must be a valid u16");

        let cors_origins = var("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS", "120")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = var("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let max_concurrent_jobs: usize = var("MAX_CONCURRENT_JOBS", "4")
            .parse()
            .expect("MAX_CONCURRENT_JOBS must be a valid usize");

        Self {
            host: var("HOST", "0.0.0.0"),
            port,
            cors_origins,
            request_timeout_secs,
            media_root: PathBuf::from(var("MEDIA_ROOT", "media")),
            max_upload_bytes,
            max_concurrent_jobs: max_concurrent_jobs.max(1),
            jwt: JwtConfig::from_lookup(&lookup),
            llm: LlmConfig::from_lookup(&lookup),
        }
    }
}
