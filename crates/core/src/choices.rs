//! Choice vocabularies for the story bible entities.
//!
//! Each vocabulary is a table of `(stored value, display label)` pairs. The
//! stored values match the CHECK constraints in the migrations; the labels
//! are what prompts and exports show to humans.

use crate::error::CoreError;

/// A `(value, label)` vocabulary table.
pub type Choices = &'static [(&'static str, &'static str)];

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

pub const BOOK_STATUS_IMPORTING: &str = "importing";
pub const BOOK_STATUS_PLANNING: &str = "planning";
pub const BOOK_STATUS_DRAFTING: &str = "drafting";

pub const BOOK_STATUSES: Choices = &[
    (BOOK_STATUS_IMPORTING, "Import in Progress"),
    (BOOK_STATUS_PLANNING, "Planning"),
    (BOOK_STATUS_DRAFTING, "Drafting"),
    ("editing", "Editing"),
    ("complete", "Complete"),
    ("published", "Published"),
];

pub const CHARACTER_ROLE_DEFAULT: &str = "supporting";

pub const CHARACTER_ROLES: Choices = &[
    ("protagonist", "Protagonist"),
    ("antagonist", "Antagonist"),
    (CHARACTER_ROLE_DEFAULT, "Supporting"),
    ("minor", "Minor"),
];

pub const TAG_CATEGORIES: Choices = &[
    ("theme", "Theme"),
    ("location", "Location"),
    ("subplot", "Subplot"),
    ("motif", "Motif"),
    ("tone", "Tone"),
    ("other", "Other"),
];

pub const TONE_DEFAULT: &str = "neutral";

pub const EMOTIONAL_TONES: Choices = &[
    ("tension", "High Tension"),
    ("action", "Action"),
    ("emotional", "Emotional"),
    ("reflective", "Reflective"),
    ("humorous", "Humorous"),
    ("dark", "Dark"),
    (TONE_DEFAULT, "Neutral"),
];

/// Story beats. The empty string means "no beat assigned".
pub const STORY_BEATS: Choices = &[
    ("", "None"),
    ("exposition", "Exposition"),
    ("inciting", "Inciting Incident"),
    ("rising", "Rising Action"),
    ("climax", "Climax"),
    ("falling", "Falling Action"),
    ("resolution", "Resolution"),
    ("setup", "Setup/Plant"),
    ("payoff", "Payoff"),
];

pub const RELATIONSHIP_TYPE_DEFAULT: &str = "neutral";

pub const RELATIONSHIP_TYPES: Choices = &[
    ("ally", "Ally/Friend"),
    ("enemy", "Enemy/Rival"),
    ("romantic", "Romantic"),
    ("family", "Family"),
    ("mentor", "Mentor/Student"),
    ("business", "Business/Professional"),
    (RELATIONSHIP_TYPE_DEFAULT, "Neutral/Acquaintance"),
];

pub const WORLD_CATEGORIES: Choices = &[
    ("location", "Location"),
    ("lore", "Lore"),
    ("faction", "Faction"),
    ("rule", "Rule/Magic System"),
    ("item", "Item/Artifact"),
    ("culture", "Culture/Society"),
    ("creature", "Creature/Species"),
    ("other", "Other"),
];

pub const ACTION_CREATE: &str = "create";
pub const ACTION_UPDATE: &str = "update";
pub const ACTION_DELETE: &str = "delete";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Return the display label for `value`, or `value` itself when unknown.
pub fn display_label<'a>(choices: Choices, value: &'a str) -> &'a str {
    choices
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
        .unwrap_or(value)
}

/// Check `value` against a vocabulary.
pub fn validate_choice(field: &str, choices: Choices, value: &str) -> Result<(), CoreError> {
    if choices.iter().any(|(v, _)| *v == value) {
        return Ok(());
    }
    let valid: Vec<&str> = choices
        .iter()
        .map(|(v, _)| *v)
        .filter(|v| !v.is_empty())
        .collect();
    Err(CoreError::Validation(format!(
        "Invalid {field} '{value}'. Valid values: {}",
        valid.join(", ")
    )))
}

/// Map free-form model output onto a vocabulary value.
///
/// Matches stored values and labels case-insensitively, then falls back to
/// a label prefix match ("High" -> "tension") before returning `default`.
pub fn coerce_choice(choices: Choices, raw: &str, default: &'static str) -> &'static str {
    let needle = raw.trim().to_lowercase();
    if needle.is_empty() {
        return default;
    }
    for (value, label) in choices {
        if *value == needle || label.to_lowercase() == needle {
            return value;
        }
    }
    for (value, label) in choices {
        let label = label.to_lowercase();
        if !value.is_empty() && (label.starts_with(&needle) || needle.starts_with(*value)) {
            return value;
        }
    }
    default
}

/// Validate a `#rrggbb` hex color code.
pub fn validate_hex_color(field: &str, color: &str) -> Result<(), CoreError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be a hex color like #3498db, got '{color}'"
        )))
    }
}

/// Validate a 1..=10 score (tension, strength, trust, predictability).
pub fn validate_score(field: &str, value: i32) -> Result<(), CoreError> {
    if (1..=10).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be between 1 and 10, got {value}"
        )))
    }
}

/// Clamp a model-provided score into 1..=10.
pub fn clamp_score(value: i64) -> i32 {
    value.clamp(1, 10) as i32
}

/// Validate a required, bounded text field.
pub fn validate_required(field: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_label_falls_back_to_value() {
        assert_eq!(display_label(EMOTIONAL_TONES, "tension"), "High Tension");
        assert_eq!(display_label(EMOTIONAL_TONES, "whimsical"), "whimsical");
    }

    #[test]
    fn validate_choice_lists_valid_values() {
        assert!(validate_choice("role", CHARACTER_ROLES, "minor").is_ok());
        let err = validate_choice("role", CHARACTER_ROLES, "villain").unwrap_err();
        assert!(err.to_string().contains("protagonist"));
    }

    #[test]
    fn empty_story_beat_is_valid() {
        assert!(validate_choice("story_beat", STORY_BEATS, "").is_ok());
    }

    #[test]
    fn coerce_choice_matches_labels_and_values() {
        assert_eq!(coerce_choice(EMOTIONAL_TONES, "High Tension", TONE_DEFAULT), "tension");
        assert_eq!(coerce_choice(EMOTIONAL_TONES, "DARK", TONE_DEFAULT), "dark");
        assert_eq!(coerce_choice(EMOTIONAL_TONES, "", TONE_DEFAULT), "neutral");
        assert_eq!(coerce_choice(EMOTIONAL_TONES, "bleak", TONE_DEFAULT), "neutral");
        assert_eq!(
            coerce_choice(RELATIONSHIP_TYPES, "Mentor", RELATIONSHIP_TYPE_DEFAULT),
            "mentor"
        );
        assert_eq!(
            coerce_choice(RELATIONSHIP_TYPES, "romantic interest", RELATIONSHIP_TYPE_DEFAULT),
            "romantic"
        );
    }

    #[test]
    fn hex_color_validation() {
        assert!(validate_hex_color("color", "#3498db").is_ok());
        assert!(validate_hex_color("color", "3498db").is_err());
        assert!(validate_hex_color("color", "#34zz db").is_err());
    }

    #[test]
    fn scores_validate_and_clamp() {
        assert!(validate_score("tension_level", 10).is_ok());
        assert!(validate_score("tension_level", 0).is_err());
        assert_eq!(clamp_score(42), 10);
        assert_eq!(clamp_score(-3), 1);
    }

    #[test]
    fn required_text_validation() {
        assert!(validate_required("title", "  ", 200).is_err());
        assert!(validate_required("title", &"x".repeat(201), 200).is_err());
        assert!(validate_required("title", "Book One", 200).is_ok());
    }
}
