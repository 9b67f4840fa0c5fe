//! Repository for the relationship synthesis caches.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::ai_cache::{
    InteractionSummary, RelationshipAnalysis, UpsertInteractionSummary, UpsertRelationshipAnalysis,
};

const SUMMARY_COLUMNS: &str = "id, book_id, character_a_id, character_b_id, batch_index, \
                               content_hash, summary_text, created_at, updated_at";

const ANALYSIS_COLUMNS: &str = "id, book_id, character_a_id, character_b_id, snapshots_hash, \
                                character_a_hash, character_b_hash, full_json, created_at, updated_at";

pub struct AiCacheRepo;

impl AiCacheRepo {
    // -----------------------------------------------------------------------
    // Interaction summaries
    // -----------------------------------------------------------------------

    pub async fn find_summary(
        pool: &PgPool,
        book_id: DbId,
        character_a_id: DbId,
        character_b_id: DbId,
        batch_index: i32,
    ) -> Result<Option<InteractionSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM interaction_summary_cache
             WHERE book_id = $1 AND character_a_id = $2 AND character_b_id = $3 AND batch_index = $4"
        );
        sqlx::query_as::<_, InteractionSummary>(&query)
            .bind(book_id)
            .bind(character_a_id)
            .bind(character_b_id)
            .bind(batch_index)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert_summary(
        pool: &PgPool,
        input: &UpsertInteractionSummary,
    ) -> Result<InteractionSummary, sqlx::Error> {
        let query = format!(
            "INSERT INTO interaction_summary_cache
                (book_id, character_a_id, character_b_id, batch_index, content_hash, summary_text)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_interaction_summary_batch DO UPDATE SET
                content_hash = EXCLUDED.content_hash,
                summary_text = EXCLUDED.summary_text
             RETURNING {SUMMARY_COLUMNS}"
        );
        sqlx::query_as::<_, InteractionSummary>(&query)
            .bind(input.book_id)
            .bind(input.character_a_id)
            .bind(input.character_b_id)
            .bind(input.batch_index)
            .bind(&input.content_hash)
            .bind(&input.summary_text)
            .fetch_one(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Relationship analyses
    // -----------------------------------------------------------------------

    pub async fn find_analysis(
        pool: &PgPool,
        book_id: DbId,
        character_a_id: DbId,
        character_b_id: DbId,
    ) -> Result<Option<RelationshipAnalysis>, sqlx::Error> {
        let query = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM relationship_analysis_cache
             WHERE book_id = $1 AND character_a_id = $2 AND character_b_id = $3"
        );
        sqlx::query_as::<_, RelationshipAnalysis>(&query)
            .bind(book_id)
            .bind(character_a_id)
            .bind(character_b_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert_analysis(
        pool: &PgPool,
        input: &UpsertRelationshipAnalysis,
    ) -> Result<RelationshipAnalysis, sqlx::Error> {
        let query = format!(
            "INSERT INTO relationship_analysis_cache
                (book_id, character_a_id, character_b_id, snapshots_hash,
                 character_a_hash, character_b_hash, full_json)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT uq_relationship_analysis_pair DO UPDATE SET
                snapshots_hash = EXCLUDED.snapshots_hash,
                character_a_hash = EXCLUDED.character_a_hash,
                character_b_hash = EXCLUDED.character_b_hash,
                full_json = EXCLUDED.full_json
             RETURNING {ANALYSIS_COLUMNS}"
        );
        sqlx::query_as::<_, RelationshipAnalysis>(&query)
            .bind(input.book_id)
            .bind(input.character_a_id)
            .bind(input.character_b_id)
            .bind(&input.snapshots_hash)
            .bind(&input.character_a_hash)
            .bind(&input.character_b_hash)
            .bind(&input.full_json)
            .fetch_one(pool)
            .await
    }

    /// Every cached analysis whose characters belong to `user_id`, oldest first.
    pub async fn list_analyses_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<RelationshipAnalysis>, sqlx::Error> {
        let query = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM relationship_analysis_cache
             WHERE character_a_id IN (SELECT id FROM characters WHERE user_id = $1)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RelationshipAnalysis>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
