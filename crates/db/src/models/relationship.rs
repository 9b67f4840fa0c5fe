//! Character relationship model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storybible_core::relationships::RelationshipProfile;
use storybible_core::types::{DbId, Timestamp};

/// A row from `character_relationships`. Pairs are stored with
/// `character_a_id < character_b_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CharacterRelationship {
    pub id: DbId,
    pub user_id: DbId,
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub relationship_type: String,
    pub description: String,
    pub strength: i32,
    pub trust_level: i32,
    pub power_dynamic: String,
    pub relationship_status: String,
    pub visibility: String,
    pub conflict_source: String,
    pub character_a_wants: String,
    pub character_b_wants: String,
    pub evolution: String,
    pub shared_secret: String,
    pub first_impression: String,
    pub vulnerability: String,
    pub major_shared_moments: String,
    pub predictability: i32,
    pub starts_at_event_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a relationship by hand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRelationship {
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub relationship_type: Option<String>,
    pub description: Option<String>,
    pub strength: Option<i32>,
    pub trust_level: Option<i32>,
    pub power_dynamic: Option<String>,
    pub relationship_status: Option<String>,
    pub visibility: Option<String>,
    pub conflict_source: Option<String>,
    pub character_a_wants: Option<String>,
    pub character_b_wants: Option<String>,
    pub evolution: Option<String>,
    pub shared_secret: Option<String>,
    pub first_impression: Option<String>,
    pub vulnerability: Option<String>,
    pub major_shared_moments: Option<String>,
    pub predictability: Option<i32>,
    pub starts_at_event_id: Option<DbId>,
}

/// DTO for updating a relationship. The pair itself is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRelationship {
    pub relationship_type: Option<String>,
    pub description: Option<String>,
    pub strength: Option<i32>,
    pub trust_level: Option<i32>,
    pub power_dynamic: Option<String>,
    pub relationship_status: Option<String>,
    pub visibility: Option<String>,
    pub conflict_source: Option<String>,
    pub character_a_wants: Option<String>,
    pub character_b_wants: Option<String>,
    pub evolution: Option<String>,
    pub shared_secret: Option<String>,
    pub first_impression: Option<String>,
    pub vulnerability: Option<String>,
    pub major_shared_moments: Option<String>,
    pub predictability: Option<i32>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub starts_at_event_id: Option<Option<DbId>>,
}

impl From<&RelationshipProfile> for UpdateRelationship {
    fn from(p: &RelationshipProfile) -> Self {
        Self {
            relationship_type: Some(p.relationship_type.clone()),
            description: Some(p.description.clone()),
            strength: Some(p.strength),
            trust_level: Some(p.trust_level),
            power_dynamic: Some(p.power_dynamic.clone()),
            relationship_status: Some(p.relationship_status.clone()),
            visibility: Some(p.visibility.clone()),
            conflict_source: Some(p.conflict_source.clone()),
            character_a_wants: Some(p.character_a_wants.clone()),
            character_b_wants: Some(p.character_b_wants.clone()),
            evolution: Some(p.evolution.clone()),
            shared_secret: Some(p.shared_secret.clone()),
            first_impression: Some(p.first_impression.clone()),
            vulnerability: Some(p.vulnerability.clone()),
            major_shared_moments: Some(p.major_shared_moments.clone()),
            predictability: Some(p.predictability),
            starts_at_event_id: None,
        }
    }
}
