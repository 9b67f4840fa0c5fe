//! Repository for the `character_relationships` table.
//!
//! Callers pass pairs already normalised (`character_a_id < character_b_id`);
//! the table's check constraint rejects anything else.

use sqlx::PgPool;
use storybible_core::types::DbId;

use crate::models::relationship::{CharacterRelationship, CreateRelationship, UpdateRelationship};

const COLUMNS: &str = "id, user_id, character_a_id, character_b_id, relationship_type, description, \
                       strength, trust_level, power_dynamic, relationship_status, visibility, \
                       conflict_source, character_a_wants, character_b_wants, evolution, \
                       shared_secret, first_impression, vulnerability, major_shared_moments, \
                       predictability, starts_at_event_id, created_at, updated_at";

pub struct RelationshipRepo;

impl RelationshipRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateRelationship,
    ) -> Result<CharacterRelationship, sqlx::Error> {
        let query = format!(
            "INSERT INTO character_relationships
                (user_id, character_a_id, character_b_id, relationship_type, description,
                 strength, trust_level, power_dynamic, relationship_status, visibility,
                 conflict_source, character_a_wants, character_b_wants, evolution,
                 shared_secret, first_impression, vulnerability, major_shared_moments,
                 predictability, starts_at_event_id)
             VALUES ($1, $2, $3, COALESCE($4, 'neutral'), COALESCE($5, ''),
                     COALESCE($6, 5), COALESCE($7, 5), COALESCE($8, 'balanced'),
                     COALESCE($9, 'active'), COALESCE($10, 'public'),
                     COALESCE($11, ''), COALESCE($12, ''), COALESCE($13, ''), COALESCE($14, ''),
                     COALESCE($15, ''), COALESCE($16, ''), COALESCE($17, ''), COALESCE($18, ''),
                     COALESCE($19, 5), $20)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CharacterRelationship>(&query)
            .bind(user_id)
            .bind(input.character_a_id)
            .bind(input.character_b_id)
            .bind(&input.relationship_type)
            .bind(&input.description)
            .bind(input.strength)
            .bind(input.trust_level)
            .bind(&input.power_dynamic)
            .bind(&input.relationship_status)
            .bind(&input.visibility)
            .bind(&input.conflict_source)
            .bind(&input.character_a_wants)
            .bind(&input.character_b_wants)
            .bind(&input.evolution)
            .bind(&input.shared_secret)
            .bind(&input.first_impression)
            .bind(&input.vulnerability)
            .bind(&input.major_shared_moments)
            .bind(input.predictability)
            .bind(input.starts_at_event_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<CharacterRelationship>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM character_relationships WHERE id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, CharacterRelationship>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the record for a normalised pair.
    pub async fn find_by_pair(
        pool: &PgPool,
        character_a_id: DbId,
        character_b_id: DbId,
    ) -> Result<Option<CharacterRelationship>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM character_relationships
             WHERE character_a_id = $1 AND character_b_id = $2"
        );
        sqlx::query_as::<_, CharacterRelationship>(&query)
            .bind(character_a_id)
            .bind(character_b_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<CharacterRelationship>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM character_relationships WHERE user_id = $1
             ORDER BY strength DESC, id ASC"
        );
        sqlx::query_as::<_, CharacterRelationship>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Relationships involving `character_id` on either side.
    pub async fn list_for_character(
        pool: &PgPool,
        character_id: DbId,
    ) -> Result<Vec<CharacterRelationship>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM character_relationships
             WHERE character_a_id = $1 OR character_b_id = $1
             ORDER BY strength DESC, id ASC"
        );
        sqlx::query_as::<_, CharacterRelationship>(&query)
            .bind(character_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateRelationship,
    ) -> Result<Option<CharacterRelationship>, sqlx::Error> {
        let query = format!(
            "UPDATE character_relationships SET {SET_FIELDS}
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        bind_update(sqlx::query_as::<_, CharacterRelationship>(&query), id, user_id, input)
            .fetch_optional(pool)
            .await
    }

    /// Get-or-create the record for a normalised pair, returning it and
    /// whether it was created.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
        character_a_id: DbId,
        character_b_id: DbId,
    ) -> Result<(CharacterRelationship, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO character_relationships (user_id, character_a_id, character_b_id)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_relationships_pair DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, CharacterRelationship>(&query)
            .bind(user_id)
            .bind(character_a_id)
            .bind(character_b_id)
            .fetch_optional(pool)
            .await?;
        if let Some(rel) = inserted {
            return Ok((rel, true));
        }
        let existing = Self::find_by_pair(pool, character_a_id, character_b_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok((existing, false))
    }


    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM character_relationships WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// `SET` clause shared by user edits and profile mirroring ($3..$19).
const SET_FIELDS: &str = "
    relationship_type = COALESCE($3, relationship_type),
    description = COALESCE($4, description),
    strength = COALESCE($5, strength),
    trust_level = COALESCE($6, trust_level),
    power_dynamic = COALESCE($7, power_dynamic),
    relationship_status = COALESCE($8, relationship_status),
    visibility = COALESCE($9, visibility),
    conflict_source = COALESCE($10, conflict_source),
    character_a_wants = COALESCE($11, character_a_wants),
    character_b_wants = COALESCE($12, character_b_wants),
    evolution = COALESCE($13, evolution),
    shared_secret = COALESCE($14, shared_secret),
    first_impression = COALESCE($15, first_impression),
    vulnerability = COALESCE($16, vulnerability),
    major_shared_moments = COALESCE($17, major_shared_moments),
    predictability = COALESCE($18, predictability),
    starts_at_event_id = CASE WHEN $20 THEN $19 ELSE starts_at_event_id END";

type RelationshipQuery<'q> = sqlx::query::QueryAs<
    'q,
    sqlx::Postgres,
    CharacterRelationship,
    sqlx::postgres::PgArguments,
>;

fn bind_update<'q>(
    query: RelationshipQuery<'q>,
    id: DbId,
    user_id: DbId,
    input: &'q UpdateRelationship,
) -> RelationshipQuery<'q> {
    query
        .bind(id)
        .bind(user_id)
        .bind(&input.relationship_type)
        .bind(&input.description)
        .bind(input.strength)
        .bind(input.trust_level)
        .bind(&input.power_dynamic)
        .bind(&input.relationship_status)
        .bind(&input.visibility)
        .bind(&input.conflict_source)
        .bind(&input.character_a_wants)
        .bind(&input.character_b_wants)
        .bind(&input.evolution)
        .bind(&input.shared_secret)
        .bind(&input.first_impression)
        .bind(&input.vulnerability)
        .bind(&input.major_shared_moments)
        .bind(input.predictability)
        .bind(input.starts_at_event_id.flatten())
        .bind(input.starts_at_event_id.is_some())
}
