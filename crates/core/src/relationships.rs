//! Relationship synthesis building blocks: pair normalisation, chronological
//! batching, content hashes, profile parsing and the mirror policy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::choices::{clamp_score, coerce_choice, RELATIONSHIP_TYPES, RELATIONSHIP_TYPE_DEFAULT};
use crate::error::CoreError;
use crate::hashing::sha256_hex;
use crate::text::{clip_chars, strip_html};
use crate::types::DbId;

/// Shared scenes are summarised in this many chronological batches.
pub const RELATIONSHIP_BATCH_COUNT: usize = 3;

/// Maximum characters of rendered text per event.
pub const EVENT_TEXT_CHARS: usize = 1_500;

pub const DEFAULT_SCORE: i32 = 5;

/// Order a character pair so that `a < b`.
pub fn normalize_pair(a: DbId, b: DbId) -> Result<(DbId, DbId), CoreError> {
    if a == b {
        return Err(CoreError::Validation(
            "A relationship needs two different characters".to_string(),
        ));
    }
    Ok((a.min(b), a.max(b)))
}

/// Split `items` into at most `batches` contiguous, non-empty slices whose
/// lengths differ by at most one. Earlier slices take the remainder.
pub fn split_batches<T>(items: &[T], batches: usize) -> Vec<&[T]> {
    if items.is_empty() || batches == 0 {
        return Vec::new();
    }
    let n = batches.min(items.len());
    let base = items.len() / n;
    let extra = items.len() % n;

    let mut out = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < extra);
        out.push(&items[start..start + len]);
        start += len;
    }
    out
}

/// Render one shared scene for the summariser.
///
/// Format is `[title] description (location)`; an empty description falls
/// back to the scene's stripped rich text. Capped at [`EVENT_TEXT_CHARS`].
pub fn render_event_text(
    title: &str,
    description: Option<&str>,
    location: Option<&str>,
    content_html: Option<&str>,
) -> String {
    let body = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| content_html.map(strip_html).filter(|c| !c.is_empty()))
        .unwrap_or_default();

    let mut text = format!("[{}] {}", title.trim(), body);
    if let Some(loc) = location.map(str::trim).filter(|l| !l.is_empty()) {
        text.push_str(&format!(" ({loc})"));
    }
    clip_chars(text.trim_end(), EVENT_TEXT_CHARS).to_string()
}

/// Hash of one batch of rendered scene texts.
pub fn batch_hash(texts: &[String]) -> String {
    sha256_hex(texts.join("\n").as_bytes())
}

/// Combined hash of all batch hashes, in batch order.
pub fn snapshots_hash(batch_hashes: &[String]) -> String {
    batch_hashes.join("|")
}

/// Hash of the character fields that shape a relationship analysis.
pub fn character_hash(traits: Option<&str>, motivation: Option<&str>, role: &str) -> String {
    let data = format!(
        "{}|{}|{}",
        traits.unwrap_or_default(),
        motivation.unwrap_or_default(),
        role
    );
    sha256_hex(data.as_bytes())
}

/// Whether a freshly synthesised profile may replace a stored relationship.
///
/// New records always take the profile; existing ones only when the incoming
/// strength is at least the stored strength.
pub fn should_overwrite(existing_strength: Option<i32>, incoming_strength: i32) -> bool {
    match existing_strength {
        None => true,
        Some(existing) => incoming_strength >= existing,
    }
}

/// Structured relationship analysis produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipProfile {
    #[serde(rename = "type")]
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
}

impl RelationshipProfile {
    /// Leniently read a profile from model or cache JSON.
    ///
    /// Accepts an `{"analysis": {...}}` wrapper, numbers given as strings,
    /// and list-valued text fields. Scores are clamped into 1..=10 and
    /// unknown relationship types become `neutral`. Returns `None` when the
    /// value is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = unwrap_analysis(value).as_object()?;
        let text = |key: &str, default: &str| -> String {
            match obj.get(key) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
                Some(Value::Null) | None => default.to_string(),
                Some(other) => other.to_string(),
            }
        };
        let score = |key: &str| -> i32 {
            let raw = match obj.get(key) {
                Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
                Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
                _ => None,
            };
            raw.map_or(DEFAULT_SCORE, clamp_score)
        };

        let raw_type = obj
            .get("type")
            .or_else(|| obj.get("relationship_type"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        Some(Self {
            relationship_type: coerce_choice(RELATIONSHIP_TYPES, raw_type, RELATIONSHIP_TYPE_DEFAULT)
                .to_string(),
            description: text("description", ""),
            strength: score("strength"),
            trust_level: score("trust_level"),
            power_dynamic: text("power_dynamic", "balanced"),
            relationship_status: text("relationship_status", "active"),
            visibility: text("visibility", "public"),
            conflict_source: text("conflict_source", ""),
            character_a_wants: text("character_a_wants", ""),
            character_b_wants: text("character_b_wants", ""),
            evolution: text("evolution", ""),
            shared_secret: text("shared_secret", ""),
            first_impression: text("first_impression", ""),
            vulnerability: text("vulnerability", ""),
            major_shared_moments: text("major_shared_moments", ""),
            predictability: score("predictability"),
        })
    }
}

/// Descend into an `analysis` object when the payload is wrapped.
pub fn unwrap_analysis(value: &Value) -> &Value {
    match value.get("analysis") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pairs_are_ordered_and_distinct() {
        assert_eq!(normalize_pair(9, 4).unwrap(), (4, 9));
        assert!(normalize_pair(3, 3).is_err());
    }

    #[test]
    fn batches_are_contiguous_and_balanced() {
        let items: Vec<i32> = (1..=7).collect();
        let batches = split_batches(&items, 3);
        assert_eq!(batches, vec![&[1, 2, 3][..], &[4, 5][..], &[6, 7][..]]);
    }

    #[test]
    fn fewer_items_than_batches_drops_empties() {
        let items = [1, 2];
        assert_eq!(split_batches(&items, 3).len(), 2);
        assert!(split_batches::<i32>(&[], 3).is_empty());
    }

    #[test]
    fn event_text_falls_back_to_rich_text() {
        assert_eq!(
            render_event_text("Duel", Some("Swords drawn."), Some("Bridge"), None),
            "[Duel] Swords drawn. (Bridge)"
        );
        assert_eq!(
            render_event_text("Duel", Some("  "), None, Some("<p>They fought.</p>")),
            "[Duel] They fought."
        );
        let long = "x".repeat(3_000);
        assert_eq!(
            render_event_text("T", Some(&long), None, None).chars().count(),
            EVENT_TEXT_CHARS
        );
    }

    #[test]
    fn hashes_follow_content() {
        let a = batch_hash(&["one".to_string(), "two".to_string()]);
        let b = batch_hash(&["one".to_string(), "three".to_string()]);
        assert_ne!(a, b);
        assert_eq!(snapshots_hash(&[a.clone(), b.clone()]), format!("{a}|{b}"));
        assert_eq!(
            character_hash(Some("brave"), None, "protagonist"),
            sha256_hex(b"brave||protagonist")
        );
    }

    #[test]
    fn overwrite_only_when_not_weaker() {
        assert!(should_overwrite(None, 1));
        assert!(should_overwrite(Some(6), 6));
        assert!(should_overwrite(Some(6), 9));
        assert!(!should_overwrite(Some(6), 5));
    }

    #[test]
    fn profile_parsing_unwraps_and_clamps() {
        let value = json!({
            "analysis": {
                "type": "Romantic",
                "description": "Slow burn.",
                "strength": 14,
                "trust_level": "3",
                "predictability": 0,
                "major_shared_moments": ["The ball", "The letter"],
                "shared_secret": null
            }
        });
        let profile = RelationshipProfile::from_json(&value).unwrap();
        assert_eq!(profile.relationship_type, "romantic");
        assert_eq!(profile.strength, 10);
        assert_eq!(profile.trust_level, 3);
        assert_eq!(profile.predictability, 1);
        assert_eq!(profile.major_shared_moments, "The ball; The letter");
        assert_eq!(profile.shared_secret, "");
        assert_eq!(profile.power_dynamic, "balanced");
    }

    #[test]
    fn unknown_type_becomes_neutral() {
        let profile = RelationshipProfile::from_json(&json!({"type": "frenemies"})).unwrap();
        assert_eq!(profile.relationship_type, "neutral");
        assert_eq!(profile.strength, DEFAULT_SCORE);
        assert!(RelationshipProfile::from_json(&json!("nope")).is_none());
    }
}
