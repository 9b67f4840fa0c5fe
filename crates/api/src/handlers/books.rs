//! Handlers for `/books`: CRUD, manuscript import, deep scan, export and
//! cover images.

use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use storybible_core::choices::{validate_choice, validate_required, BOOK_STATUSES, BOOK_STATUS_IMPORTING};
use storybible_core::error::CoreError;
use storybible_core::import_status::{MSG_DEEP_SCAN_QUEUED, MSG_IMPORT_QUEUED, PROGRESS_START};
use storybible_core::types::DbId;
use storybible_db::models::book::{Book, BookResponse, CreateBook, ImportStatus, UpdateBook};
use storybible_db::repositories::BookRepo;
use storybible_events::bus::MODEL_BOOK;
use storybible_events::ActivityEvent;
use storybible_pipeline::deep_scan::DeepScanJob;
use storybible_pipeline::extract::extract_text;
use storybible_pipeline::import::ImportJob;

use crate::engine::{BookJob, BookSlot};
use crate::error::{AppError, AppResult};
use crate::export::StoryBible;
use crate::media::{remove_image, store_image, ImageTarget, UploadForm};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 255;

fn validate_book_fields(
    title: Option<&str>,
    status: Option<&str>,
    word_count_target: Option<i32>,
) -> Result<(), CoreError> {
    if let Some(title) = title {
        validate_required("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(status) = status {
        validate_choice("status", BOOK_STATUSES, status)?;
    }
    if word_count_target.is_some_and(|t| t < 0) {
        return Err(CoreError::Validation("word_count_target must not be negative".into()));
    }
    Ok(())
}

async fn load_book(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Book> {
    BookRepo::find_by_id(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("book", id))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/books
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let books: Vec<BookResponse> = BookRepo::list_by_user(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .map(BookResponse::from)
        .collect();
    Ok(Json(DataResponse::new(books)))
}

/// POST /api/v1/books
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBook>,
) -> AppResult<impl IntoResponse> {
    validate_book_fields(Some(&input.title), input.status.as_deref(), input.word_count_target)?;
    let book = BookRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(book_id = book.id, user_id = auth.user_id, "Book created");
    state
        .event_bus
        .publish(ActivityEvent::created(auth.user_id, MODEL_BOOK, &book.title));
    Ok((StatusCode::CREATED, Json(DataResponse::new(BookResponse::from(book)))))
}

/// GET /api/v1/books/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let book = load_book(&state, auth.user_id, id).await?;
    Ok(Json(DataResponse::new(BookResponse::from(book))))
}

/// PUT /api/v1/books/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBook>,
) -> AppResult<impl IntoResponse> {
    validate_book_fields(input.title.as_deref(), input.status.as_deref(), input.word_count_target)?;
    let book = BookRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("book", id))?;

    state
        .event_bus
        .publish(ActivityEvent::updated(auth.user_id, MODEL_BOOK, &book.title));
    Ok(Json(DataResponse::new(BookResponse::from(book))))
}

/// DELETE /api/v1/books/{id}
///
/// Chapters and events go with the book.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let book = load_book(&state, auth.user_id, id).await?;
    if state.jobs.is_busy(id) {
        return Err(AppError::Core(CoreError::Conflict(
            "Book cannot be deleted while an import or deep scan is running".into(),
        )));
    }
    BookRepo::delete(&state.pool, auth.user_id, id).await?;
    remove_image(&state.config.media_root, book.cover_image_path.as_deref()).await;

    tracing::info!(book_id = id, user_id = auth.user_id, "Book deleted");
    state
        .event_bus
        .publish(ActivityEvent::deleted(auth.user_id, MODEL_BOOK, &book.title));
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Import and deep scan
// ---------------------------------------------------------------------------

async fn extract_upload(form: &mut UploadForm) -> AppResult<String> {
    let (filename, bytes) = form.take_file()?;
    let text = tokio::task::spawn_blocking(move || extract_text(&filename, &bytes))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;
    Ok(text)
}

/// Mark the book as importing and hand the manuscript to the job runner.
async fn queue_import(state: &AppState, slot: BookSlot, user_id: DbId, book_id: DbId, text: String) -> AppResult<()> {
    BookRepo::update_progress(
        &state.pool,
        book_id,
        Some(BOOK_STATUS_IMPORTING),
        PROGRESS_START,
        MSG_IMPORT_QUEUED,
    )
    .await?;
    tracing::info!(book_id, user_id, chars = text.len(), "Import queued");
    state.jobs.spawn(slot, BookJob::Import(ImportJob { user_id, book_id, text }));
    Ok(())
}

async fn accepted_status(state: &AppState, user_id: DbId, book_id: DbId) -> AppResult<impl IntoResponse> {
    let status = BookRepo::import_status(&state.pool, user_id, book_id)
        .await?
        .ok_or_else(|| AppError::not_found("book", book_id))?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse::new(status))))
}

/// POST /api/v1/books/import
///
/// Multipart fields: `file` (txt, md or docx), `title`, optional
/// `series_order`. Creates the book and starts the import.
pub async fn import_new(
    auth: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = UploadForm::read(multipart).await?;
    let title = form
        .field("title")
        .ok_or_else(|| AppError::BadRequest("Missing required 'title' field".into()))?
        .to_string();
    validate_required("title", &title, MAX_TITLE_LEN)?;
    let series_order = form
        .field("series_order")
        .map(|raw| {
            raw.parse::<i32>()
                .map_err(|_| AppError::BadRequest("series_order must be an integer".into()))
        })
        .transpose()?;
    let text = extract_upload(&mut form).await?;

    let book = BookRepo::create(
        &state.pool,
        auth.user_id,
        &CreateBook {
            title,
            series_order,
            status: Some(BOOK_STATUS_IMPORTING.to_string()),
            ..Default::default()
        },
    )
    .await?;
    state
        .event_bus
        .publish(ActivityEvent::created(auth.user_id, MODEL_BOOK, &book.title));

    let slot = state.jobs.reserve(book.id)?;
    queue_import(&state, slot, auth.user_id, book.id, text).await?;
    accepted_status(&state, auth.user_id, book.id).await
}

/// POST /api/v1/books/{id}/import
///
/// Import a manuscript into an existing book. Chapters are matched by
/// number; characters by name.
pub async fn reimport(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    load_book(&state, auth.user_id, id).await?;
    let slot = state.jobs.reserve(id)?;
    let mut form = UploadForm::read(multipart).await?;
    let text = extract_upload(&mut form).await?;

    queue_import(&state, slot, auth.user_id, id, text).await?;
    accepted_status(&state, auth.user_id, id).await
}

/// GET /api/v1/books/{id}/import-status
pub async fn import_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ImportStatus>>> {
    let status = BookRepo::import_status(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("book", id))?;
    Ok(Json(DataResponse::new(status)))
}

/// POST /api/v1/books/{id}/deep-scan
pub async fn deep_scan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_book(&state, auth.user_id, id).await?;
    let slot = state.jobs.reserve(id)?;
    BookRepo::update_progress(&state.pool, id, None, PROGRESS_START, MSG_DEEP_SCAN_QUEUED).await?;

    tracing::info!(book_id = id, user_id = auth.user_id, "Deep scan queued");
    state.jobs.spawn(
        slot,
        BookJob::DeepScan(DeepScanJob {
            user_id: auth.user_id,
            book_id: id,
        }),
    );
    accepted_status(&state, auth.user_id, id).await
}

// ---------------------------------------------------------------------------
// Export and cover
// ---------------------------------------------------------------------------

/// GET /api/v1/books/{id}/export
pub async fn export(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let bible = StoryBible::load(&state.pool, auth.user_id, id).await?;
    let disposition = format!("attachment; filename=\"{}\"", bible.filename());
    Ok((
        [
            (CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bible.to_markdown(),
    ))
}

/// POST /api/v1/books/{id}/cover
pub async fn upload_cover(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let book = load_book(&state, auth.user_id, id).await?;
    let (_, bytes) = UploadForm::read(multipart).await?.take_file()?;

    let path = store_image(&state.config.media_root, ImageTarget::BookCover, id, bytes).await?;
    BookRepo::set_cover_image(&state.pool, id, &path).await?;
    remove_image(&state.config.media_root, book.cover_image_path.as_deref()).await;

    let book = load_book(&state, auth.user_id, id).await?;
    Ok(Json(DataResponse::new(BookResponse::from(book))))
}
