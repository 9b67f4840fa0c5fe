//! Handlers for `/relationships`: manual CRUD, the relationship graph and
//! AI analysis of character pairs.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use storybible_core::choices::{validate_choice, validate_score, RELATIONSHIP_TYPES};
use storybible_core::error::CoreError;
use storybible_core::relationships::normalize_pair;
use storybible_core::types::DbId;
use storybible_db::models::character::Character;
use storybible_db::models::relationship::{CharacterRelationship, CreateRelationship, UpdateRelationship};
use storybible_db::repositories::{BookRepo, CharacterRepo, RelationshipRepo};
use storybible_events::bus::MODEL_RELATIONSHIP;
use storybible_events::ActivityEvent;
use storybible_pipeline::relationships::{analyze_pair, sync_from_cache};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub book_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub relationship: CharacterRelationship,
    pub created: bool,
    pub applied: bool,
    pub from_cache: bool,
    pub shared_scenes: usize,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub synced: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct GraphParams {
    /// Restrict the graph to characters appearing in this book.
    pub book_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct GraphNode {
    pub id: DbId,
    pub name: String,
    pub role: String,
    pub color_code: String,
}

#[derive(Debug, Serialize)]
pub struct GraphEdge {
    pub id: DbId,
    pub source: DbId,
    pub target: DbId,
    pub relationship_type: String,
    pub strength: i32,
    pub trust_level: i32,
}

#[derive(Debug, Serialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

fn validate_values(
    relationship_type: Option<&str>,
    scores: [(&str, Option<i32>); 3],
) -> Result<(), CoreError> {
    if let Some(kind) = relationship_type {
        validate_choice("relationship_type", RELATIONSHIP_TYPES, kind)?;
    }
    for (field, value) in scores {
        if let Some(value) = value {
            validate_score(field, value)?;
        }
    }
    Ok(())
}

async fn require_character(state: &AppState, user_id: DbId, id: DbId) -> AppResult<Character> {
    CharacterRepo::find_by_id(&state.pool, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("character", id))
}

/// "A & B" label for the activity log.
async fn pair_label(state: &AppState, user_id: DbId, rel: &CharacterRelationship) -> AppResult<String> {
    let name = |c: Option<Character>, id: DbId| c.map_or_else(|| format!("#{id}"), |c| c.name);
    let a = CharacterRepo::find_by_id(&state.pool, user_id, rel.character_a_id).await?;
    let b = CharacterRepo::find_by_id(&state.pool, user_id, rel.character_b_id).await?;
    Ok(format!("{} & {}", name(a, rel.character_a_id), name(b, rel.character_b_id)))
}

/// GET /api/v1/relationships
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CharacterRelationship>>>> {
    let relationships = RelationshipRepo::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(relationships)))
}

/// POST /api/v1/relationships
///
/// The pair is stored in ascending id order; a second record for the same
/// pair is a conflict.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateRelationship>,
) -> AppResult<impl IntoResponse> {
    let (a, b) = normalize_pair(input.character_a_id, input.character_b_id)?;
    validate_values(
        input.relationship_type.as_deref(),
        [
            ("strength", input.strength),
            ("trust_level", input.trust_level),
            ("predictability", input.predictability),
        ],
    )?;
    let first = require_character(&state, auth.user_id, a).await?;
    let second = require_character(&state, auth.user_id, b).await?;

    if (input.character_a_id, input.character_b_id) != (a, b) {
        std::mem::swap(&mut input.character_a_wants, &mut input.character_b_wants);
    }
    input.character_a_id = a;
    input.character_b_id = b;
    let relationship = RelationshipRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(relationship_id = relationship.id, a, b, "Relationship created");
    state.event_bus.publish(ActivityEvent::created(
        auth.user_id,
        MODEL_RELATIONSHIP,
        format!("{} & {}", first.name, second.name),
    ));
    Ok((StatusCode::CREATED, Json(DataResponse::new(relationship))))
}

/// PUT /api/v1/relationships/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRelationship>,
) -> AppResult<Json<DataResponse<CharacterRelationship>>> {
    validate_values(
        input.relationship_type.as_deref(),
        [
            ("strength", input.strength),
            ("trust_level", input.trust_level),
            ("predictability", input.predictability),
        ],
    )?;
    let relationship = RelationshipRepo::update(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("relationship", id))?;

    let label = pair_label(&state, auth.user_id, &relationship).await?;
    state
        .event_bus
        .publish(ActivityEvent::updated(auth.user_id, MODEL_RELATIONSHIP, label));
    Ok(Json(DataResponse::new(relationship)))
}

/// DELETE /api/v1/relationships/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let relationship = RelationshipRepo::find_by_id(&state.pool, auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("relationship", id))?;
    let label = pair_label(&state, auth.user_id, &relationship).await?;
    RelationshipRepo::delete(&state.pool, auth.user_id, id).await?;

    state
        .event_bus
        .publish(ActivityEvent::deleted(auth.user_id, MODEL_RELATIONSHIP, label));
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/relationships/graph
///
/// Characters as nodes, relationships as edges. Edges only connect nodes
/// present in the response.
pub async fn graph(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<GraphParams>,
) -> AppResult<Json<DataResponse<RelationshipGraph>>> {
    let characters = match params.book_id {
        Some(book_id) => {
            BookRepo::find_by_id(&state.pool, auth.user_id, book_id)
                .await?
                .ok_or_else(|| AppError::not_found("book", book_id))?;
            CharacterRepo::list_by_book(&state.pool, book_id).await?
        }
        None => CharacterRepo::list_by_user(&state.pool, auth.user_id).await?,
    };
    let present: HashSet<DbId> = characters.iter().map(|c| c.id).collect();

    let edges = RelationshipRepo::list_by_user(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .filter(|r| present.contains(&r.character_a_id) && present.contains(&r.character_b_id))
        .map(|r| GraphEdge {
            id: r.id,
            source: r.character_a_id,
            target: r.character_b_id,
            relationship_type: r.relationship_type,
            strength: r.strength,
            trust_level: r.trust_level,
        })
        .collect();
    let nodes = characters
        .into_iter()
        .map(|c| GraphNode {
            id: c.id,
            name: c.name,
            role: c.role,
            color_code: c.color_code,
        })
        .collect();

    Ok(Json(DataResponse::new(RelationshipGraph { nodes, edges })))
}

/// POST /api/v1/relationships/analyze
///
/// 404 when the characters share no scene in the book; 503 when the model
/// is unavailable and nothing is cached.
pub async fn analyze(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AnalyzeRequest>,
) -> AppResult<Json<DataResponse<AnalyzeResponse>>> {
    let analysis = analyze_pair(
        &state.pool,
        state.llm.as_ref(),
        auth.user_id,
        input.book_id,
        input.character_a_id,
        input.character_b_id,
    )
    .await?;

    tracing::info!(
        book_id = input.book_id,
        relationship_id = analysis.relationship.id,
        from_cache = analysis.from_cache,
        applied = analysis.applied,
        "Relationship analysed",
    );
    Ok(Json(DataResponse::new(AnalyzeResponse {
        relationship: analysis.relationship,
        created: analysis.created,
        applied: analysis.applied,
        from_cache: analysis.from_cache,
        shared_scenes: analysis.shared_scenes,
    })))
}

/// POST /api/v1/relationships/sync-from-cache
pub async fn sync(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<DataResponse<SyncResponse>>> {
    let synced = sync_from_cache(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(SyncResponse { synced })))
}
