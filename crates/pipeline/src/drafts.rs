//! Lenient readers for model JSON.
//!
//! Models drift from the requested schema: lists arrive as comma strings,
//! numbers as strings, keys under near-synonyms. These readers accept the
//! common variants and drop entries that lack a name or title.

use serde_json::{Map, Value};
use storybible_core::choices::{
    clamp_score, coerce_choice, CHARACTER_ROLES, CHARACTER_ROLE_DEFAULT, EMOTIONAL_TONES,
    STORY_BEATS, TONE_DEFAULT,
};
use storybible_core::relationships::DEFAULT_SCORE;

/// A character proposed by the import's character pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterCandidate {
    pub name: String,
    pub aliases: Vec<String>,
    pub role: &'static str,
    pub description: String,
    pub traits: String,
    pub motivation: String,
}

/// One chapter of an import batch reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDraft {
    pub chunk_index: Option<usize>,
    pub title: String,
    pub summary: String,
    pub events: Vec<EventDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub story_date: String,
    pub characters: Vec<String>,
    pub pov: Option<String>,
    pub emotional_tone: &'static str,
    pub story_beat: &'static str,
    pub tension_level: i32,
}

/// Deep-scan refresh of one character. Empty values are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterRefresh {
    pub description: Option<String>,
    pub traits: Option<String>,
    pub motivation: Option<String>,
    pub goals: Option<String>,
}

impl CharacterRefresh {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.traits.is_none()
            && self.motivation.is_none()
            && self.goals.is_none()
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// The list under `key`, or the value itself when it is already a list.
fn list_under<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(obj) => obj.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice),
        _ => &[],
    }
}

fn first_key<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

/// String value; lists are joined with `", "`, numbers stringified.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> String {
    match first_key(obj, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// String list; a single string is split on commas.
fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let raw: Vec<String> = match first_key(obj, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(String::from).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn integer(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    match first_key(obj, keys)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Read `{"characters": [...]}` (or a bare list).
pub fn character_candidates(value: &Value) -> Vec<CharacterCandidate> {
    list_under(value, "characters")
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let name = text(obj, &["name", "full_name"]);
            if name.is_empty() {
                return None;
            }
            let role = text(obj, &["role"]);
            Some(CharacterCandidate {
                aliases: string_list(obj, &["aliases", "alias", "nicknames"]),
                role: coerce_choice(CHARACTER_ROLES, &role, CHARACTER_ROLE_DEFAULT),
                description: text(obj, &["description", "summary"]),
                traits: text(obj, &["traits", "personality"]),
                motivation: text(obj, &["motivation", "motivations"]),
                name,
            })
        })
        .collect()
}

/// Read `{"chapters": [...]}` (or a bare list).
pub fn chapter_drafts(value: &Value) -> Vec<ChapterDraft> {
    list_under(value, "chapters")
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| ChapterDraft {
            chunk_index: integer(obj, &["chunk_index", "index"])
                .and_then(|i| usize::try_from(i).ok()),
            title: text(obj, &["title", "chapter_title"]),
            summary: text(obj, &["summary", "description"]),
            events: list_under(obj.get("events").unwrap_or(&Value::Null), "events")
                .iter()
                .filter_map(Value::as_object)
                .filter_map(event_draft)
                .collect(),
        })
        .collect()
}

fn event_draft(obj: &Map<String, Value>) -> Option<EventDraft> {
    let title = text(obj, &["title", "name"]);
    if title.is_empty() {
        return None;
    }
    let tone = text(obj, &["emotional_tone", "tone"]);
    let beat = text(obj, &["story_beat", "beat"]);
    Some(EventDraft {
        title,
        description: text(obj, &["description", "summary"]),
        location: text(obj, &["location", "setting"]),
        story_date: text(obj, &["story_date", "date", "time"]),
        characters: string_list(obj, &["characters", "character_names"]),
        pov: non_empty(text(obj, &["pov", "pov_character"])),
        emotional_tone: coerce_choice(EMOTIONAL_TONES, &tone, TONE_DEFAULT),
        story_beat: coerce_choice(STORY_BEATS, &beat, ""),
        tension_level: integer(obj, &["tension_level", "tension"])
            .map_or(DEFAULT_SCORE, clamp_score),
    })
}

/// Read a deep-scan character refresh.
pub fn character_refresh(value: &Value) -> CharacterRefresh {
    let Some(obj) = value.get("character").unwrap_or(value).as_object() else {
        return CharacterRefresh::default();
    };
    CharacterRefresh {
        description: non_empty(text(obj, &["description"])),
        traits: non_empty(text(obj, &["traits"])),
        motivation: non_empty(text(obj, &["motivation"])),
        goals: non_empty(text(obj, &["goals"])),
    }
}

/// Read focus-task text from `{"tasks": [...]}` or a bare list. Items may
/// be strings or `{"task": ...}` objects.
pub fn task_lines(value: &Value) -> Vec<String> {
    list_under(value, "tasks")
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => non_empty(text(obj, &["task", "text", "title"])),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn candidates_accept_list_and_string_aliases() {
        let value = json!({"characters": [
            {"name": "Elara Voss", "aliases": ["El", "The Wanderer"], "role": "Protagonist",
             "traits": ["stubborn", "kind"], "motivation": "Find her brother"},
            {"name": "Bram", "aliases": "Old Bram, the smith", "role": "sidekick"},
            {"aliases": ["nameless"]}
        ]});
        let candidates = character_candidates(&value);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].aliases, vec!["El", "The Wanderer"]);
        assert_eq!(candidates[0].role, "protagonist");
        assert_eq!(candidates[0].traits, "stubborn, kind");
        assert_eq!(candidates[1].aliases, vec!["Old Bram", "the smith"]);
        assert_eq!(candidates[1].role, "supporting");
    }

    #[test]
    fn bare_list_of_characters() {
        let candidates = character_candidates(&json!([{"name": "Corin"}]));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].description, "");
    }

    #[test]
    fn chapter_drafts_sanitise_events() {
        let value = json!({"chapters": [{
            "chunk_index": "1",
            "title": "The Market",
            "summary": "They meet.",
            "events": [
                {"title": "Arrival", "characters": "Elara, Bram", "pov": "Elara",
                 "tone": "High Tension", "beat": "Inciting Incident", "tension": "12"},
                {"title": "", "description": "untitled scenes are dropped"},
                {"title": "Haggling", "emotional_tone": "whimsical", "story_beat": "twist",
                 "tension_level": 0}
            ]
        }]});
        let drafts = chapter_drafts(&value);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].chunk_index, Some(1));
        let events = &drafts[0].events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].characters, vec!["Elara", "Bram"]);
        assert_eq!(events[0].pov.as_deref(), Some("Elara"));
        assert_eq!(events[0].emotional_tone, "tension");
        assert_eq!(events[0].story_beat, "inciting");
        assert_eq!(events[0].tension_level, 10);
        assert_eq!(events[1].emotional_tone, "neutral");
        assert_eq!(events[1].story_beat, "");
        assert_eq!(events[1].tension_level, 1);
    }

    #[test]
    fn chapter_without_events() {
        let drafts = chapter_drafts(&json!({"chapters": [{"title": "Quiet"}]}));
        assert_eq!(drafts[0].chunk_index, None);
        assert!(drafts[0].events.is_empty());
    }

    #[test]
    fn refresh_drops_blank_fields() {
        let refresh = character_refresh(&json!({"description": "A smith", "traits": "", "goals": null}));
        assert_eq!(refresh.description.as_deref(), Some("A smith"));
        assert!(refresh.traits.is_none());
        assert!(refresh.goals.is_none());
        assert!(!refresh.is_empty());
        assert!(character_refresh(&json!("nope")).is_empty());
    }

    #[test]
    fn task_lines_from_objects_and_strings() {
        assert_eq!(
            task_lines(&json!({"tasks": ["Write", {"task": "Revise"}, 3]})),
            vec!["Write", "Revise"]
        );
        assert_eq!(task_lines(&json!(["One"])), vec!["One"]);
    }
}
