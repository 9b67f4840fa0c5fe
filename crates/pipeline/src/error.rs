use storybible_core::error::CoreError;
use storybible_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The uploaded file type is not supported.
    #[error("Unsupported file type '{0}'. Upload a .txt, .md or .docx file")]
    UnsupportedFormat(String),

    /// The document could not be read.
    #[error("Could not read document: {0}")]
    Extract(String),

    #[error("The document contains no text")]
    EmptyDocument,

    /// The two characters never appear in a scene together.
    #[error("Characters {0} and {1} share no scenes in this book")]
    NoSharedScenes(DbId, DbId),

    /// The model produced nothing usable after all retries.
    #[error("AI service is unavailable, try again later")]
    AiUnavailable,

    #[error("Job cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        PipelineError::Core(CoreError::NotFound { entity, id })
    }
}
