//! Handlers for `/dashboard` and `/activity`.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use storybible_core::pagination::RECENT_ACTIVITY_LIMIT;
use storybible_db::models::activity::ActivityLog;
use storybible_db::models::book::BookResponse;
use storybible_db::models::dashboard::DashboardStats;
use storybible_db::models::event::Event;
use storybible_db::repositories::{ActivityRepo, BookRepo, DashboardRepo, EventRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const RECENT_EVENTS: i64 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardBook {
    #[serde(flatten)]
    pub book: BookResponse,
    pub chapter_count: i64,
    pub event_count: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub books: Vec<DashboardBook>,
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub recent_events: Vec<Event>,
    pub recent_activity: Vec<ActivityLog>,
}

/// GET /api/v1/dashboard
pub async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<DataResponse<Dashboard>>> {
    let pool = &state.pool;
    let counts: HashMap<_, _> = DashboardRepo::book_counts(pool, auth.user_id)
        .await?
        .into_iter()
        .map(|c| (c.book_id, c))
        .collect();

    let books = BookRepo::list_by_user(pool, auth.user_id)
        .await?
        .into_iter()
        .map(|book| {
            let c = counts.get(&book.id);
            DashboardBook {
                chapter_count: c.map_or(0, |c| c.chapter_count),
                event_count: c.map_or(0, |c| c.event_count),
                book: BookResponse::from(book),
            }
        })
        .collect();

    let dashboard = Dashboard {
        books,
        stats: DashboardRepo::stats(pool, auth.user_id).await?,
        recent_events: EventRepo::list_recent(pool, auth.user_id, RECENT_EVENTS).await?,
        recent_activity: ActivityRepo::list_recent(pool, auth.user_id, RECENT_ACTIVITY_LIMIT, 0).await?,
    };
    Ok(Json(DataResponse::new(dashboard)))
}

/// GET /api/v1/activity
pub async fn activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ActivityLog>>>> {
    let entries = ActivityRepo::list_recent(
        &state.pool,
        auth.user_id,
        params.limit_or(RECENT_ACTIVITY_LIMIT),
        params.offset(),
    )
    .await?;
    Ok(Json(DataResponse::new(entries)))
}
