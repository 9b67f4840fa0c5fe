//! Relationship synthesis for a character pair within a book.
//!
//! Shared scenes are split into three chronological batches, each batch is
//! summarised, and the summaries are condensed into a
//! [`RelationshipProfile`]. Both steps are cached by content hash so an
//! unchanged pair costs no model calls. The profile is then mirrored into
//! the permanent `character_relationships` row.

use sqlx::PgPool;
use storybible_core::relationships::{
    batch_hash, character_hash, normalize_pair, render_event_text, should_overwrite,
    snapshots_hash, split_batches, RelationshipProfile, RELATIONSHIP_BATCH_COUNT,
};
use storybible_core::types::DbId;
use storybible_db::models::ai_cache::{UpsertInteractionSummary, UpsertRelationshipAnalysis};
use storybible_db::models::character::Character;
use storybible_db::models::relationship::{CharacterRelationship, UpdateRelationship};
use storybible_db::repositories::{AiCacheRepo, BookRepo, CharacterRepo, EventRepo, RelationshipRepo};
use storybible_llm::{complete_json, complete_text, CompletionRequest, LlmClient};

use crate::error::PipelineError;
use crate::prompts::{self, CharacterBrief};

/// Stands in for the hash of a batch that produced no summary.
const DROPPED_BATCH_HASH: &str = "-";

/// Result of analysing one pair.
#[derive(Debug, Clone)]
pub struct PairAnalysis {
    pub relationship: CharacterRelationship,
    pub profile: RelationshipProfile,
    /// The stored relationship row did not exist before.
    pub created: bool,
    /// The profile was written into the stored row.
    pub applied: bool,
    /// The profile came from the analysis cache.
    pub from_cache: bool,
    pub shared_scenes: usize,
}

/// Analyse the relationship between two characters in a book.
pub async fn analyze_pair(
    pool: &PgPool,
    llm: &dyn LlmClient,
    user_id: DbId,
    book_id: DbId,
    character_a_id: DbId,
    character_b_id: DbId,
) -> Result<PairAnalysis, PipelineError> {
    let (a_id, b_id) = normalize_pair(character_a_id, character_b_id)?;

    BookRepo::find_by_id(pool, user_id, book_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("book", book_id))?;
    let a = load_character(pool, user_id, a_id).await?;
    let b = load_character(pool, user_id, b_id).await?;

    let scenes = EventRepo::shared_scenes(pool, book_id, a_id, b_id).await?;
    if scenes.is_empty() {
        return Err(PipelineError::NoSharedScenes(a_id, b_id));
    }
    let texts: Vec<String> = scenes
        .iter()
        .map(|s| {
            render_event_text(
                &s.title,
                Some(&s.description),
                Some(&s.location),
                Some(&s.content_html),
            )
        })
        .collect();

    let batches = split_batches(&texts, RELATIONSHIP_BATCH_COUNT);
    let mut batch_hashes = Vec::with_capacity(batches.len());
    let mut summaries = Vec::with_capacity(batches.len());

    for (index, batch) in batches.iter().enumerate() {
        let hash = batch_hash(batch);
        let summary =
            batch_summary(pool, llm, book_id, &a, &b, index, batches.len(), batch, &hash).await?;
        match summary {
            Some(text) => {
                batch_hashes.push(hash);
                summaries.push(text);
            }
            None => {
                // Keeps the snapshot distinct from a complete run.
                batch_hashes.push(DROPPED_BATCH_HASH.to_string());
                tracing::warn!(book_id, a_id, b_id, batch = index, "Dropping unsummarised batch");
            }
        }
    }
    if summaries.is_empty() {
        return Err(PipelineError::AiUnavailable);
    }

    let snapshots = snapshots_hash(&batch_hashes);
    let a_hash = character_hash(Some(&a.traits), Some(&a.motivation), &a.role);
    let b_hash = character_hash(Some(&b.traits), Some(&b.motivation), &b.role);

    let cached = AiCacheRepo::find_analysis(pool, book_id, a_id, b_id)
        .await?
        .filter(|c| c.matches(&snapshots, &a_hash, &b_hash))
        .and_then(|c| RelationshipProfile::from_json(&c.full_json));

    let from_cache = cached.is_some();
    let profile = match cached {
        Some(profile) => {
            tracing::debug!(book_id, a_id, b_id, "Relationship analysis cache hit");
            profile
        }
        None => {
            let profile = synthesise(llm, &a, &b, &summaries)
                .await
                .ok_or(PipelineError::AiUnavailable)?;
            AiCacheRepo::upsert_analysis(
                pool,
                &UpsertRelationshipAnalysis {
                    book_id,
                    character_a_id: a_id,
                    character_b_id: b_id,
                    snapshots_hash: snapshots,
                    character_a_hash: a_hash,
                    character_b_hash: b_hash,
                    full_json: serde_json::to_value(&profile)?,
                },
            )
            .await?;
            profile
        }
    };

    let mirrored = mirror_profile(pool, user_id, a_id, b_id, &profile).await?;
    tracing::info!(
        book_id,
        a_id,
        b_id,
        scenes = scenes.len(),
        from_cache,
        applied = mirrored.applied,
        "Relationship analysed"
    );

    Ok(PairAnalysis {
        relationship: mirrored.relationship,
        profile,
        created: mirrored.created,
        applied: mirrored.applied,
        from_cache,
        shared_scenes: scenes.len(),
    })
}

async fn load_character(pool: &PgPool, user_id: DbId, id: DbId) -> Result<Character, PipelineError> {
    CharacterRepo::find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| PipelineError::not_found("character", id))
}

/// Cached or freshly generated summary of one batch. `None` when the
/// model gave nothing.
#[allow(clippy::too_many_arguments)]
async fn batch_summary(
    pool: &PgPool,
    llm: &dyn LlmClient,
    book_id: DbId,
    a: &Character,
    b: &Character,
    index: usize,
    total: usize,
    batch: &[String],
    hash: &str,
) -> Result<Option<String>, PipelineError> {
    let batch_index = index as i32;
    if let Some(cached) = AiCacheRepo::find_summary(pool, book_id, a.id, b.id, batch_index).await? {
        if cached.content_hash == hash {
            return Ok(Some(cached.summary_text));
        }
    }

    let request = CompletionRequest::new(prompts::interaction_summary(&a.name, &b.name, index, total, batch))
        .with_temperature(0.4)
        .with_max_tokens(600);
    let Some(text) = complete_text(llm, "interaction_summary", &request).await else {
        return Ok(None);
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Ok(None);
    }

    AiCacheRepo::upsert_summary(
        pool,
        &UpsertInteractionSummary {
            book_id,
            character_a_id: a.id,
            character_b_id: b.id,
            batch_index,
            content_hash: hash.to_string(),
            summary_text: text.clone(),
        },
    )
    .await?;
    Ok(Some(text))
}

fn brief(c: &Character) -> CharacterBrief<'_> {
    CharacterBrief {
        name: &c.name,
        role: &c.role,
        traits: &c.traits,
        motivation: &c.motivation,
    }
}

async fn synthesise(
    llm: &dyn LlmClient,
    a: &Character,
    b: &Character,
    summaries: &[String],
) -> Option<RelationshipProfile> {
    let request = CompletionRequest::new(prompts::relationship_profile(&brief(a), &brief(b), summaries))
        .with_system(prompts::EDITOR_SYSTEM)
        .json();
    let value = complete_json(llm, "relationship_profile", &request).await?;
    RelationshipProfile::from_json(&value)
}

/// Outcome of writing a profile into `character_relationships`.
#[derive(Debug, Clone)]
pub struct Mirrored {
    pub relationship: CharacterRelationship,
    pub created: bool,
    pub applied: bool,
}

/// Write a profile into the permanent relationship row for a pair.
///
/// A new row always takes the profile; an existing row only when the
/// incoming strength is at least the stored one.
pub async fn mirror_profile(
    pool: &PgPool,
    user_id: DbId,
    character_a_id: DbId,
    character_b_id: DbId,
    profile: &RelationshipProfile,
) -> Result<Mirrored, PipelineError> {
    let (relationship, created) =
        RelationshipRepo::get_or_create(pool, user_id, character_a_id, character_b_id).await?;
    let existing = (!created).then_some(relationship.strength);
    if !should_overwrite(existing, profile.strength) {
        return Ok(Mirrored { relationship, created, applied: false });
    }
    let relationship = write_profile(pool, user_id, relationship, profile).await?;
    Ok(Mirrored { relationship, created, applied: true })
}

async fn write_profile(
    pool: &PgPool,
    user_id: DbId,
    relationship: CharacterRelationship,
    profile: &RelationshipProfile,
) -> Result<CharacterRelationship, PipelineError> {
    let id = relationship.id;
    Ok(RelationshipRepo::update(pool, user_id, id, &UpdateRelationship::from(profile))
        .await?
        .unwrap_or(relationship))
}

/// Mirror every cached analysis of the user into permanent relationship
/// rows, overwriting unconditionally. Returns the number of rows written.
pub async fn sync_from_cache(pool: &PgPool, user_id: DbId) -> Result<usize, PipelineError> {
    let analyses = AiCacheRepo::list_analyses_for_user(pool, user_id).await?;
    let mut written = 0;
    for analysis in &analyses {
        let Some(profile) = RelationshipProfile::from_json(&analysis.full_json) else {
            tracing::warn!(analysis_id = analysis.id, "Skipping unreadable cached analysis");
            continue;
        };
        let (relationship, _) = RelationshipRepo::get_or_create(
            pool,
            user_id,
            analysis.character_a_id,
            analysis.character_b_id,
        )
        .await?;
        write_profile(pool, user_id, relationship, &profile).await?;
        written += 1;
    }
    tracing::info!(user_id, cached = analyses.len(), written, "Synced relationships from cache");
    Ok(written)
}
