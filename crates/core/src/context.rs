//! Keyword-driven story context for LLM prompts.
//!
//! [`ContextResolver`] indexes a user's characters and world entries by
//! their lower-cased names, scans free text for whole-word mentions and
//! renders the matched entities as a compact prompt block.

use std::collections::HashMap;

use regex::Regex;

use crate::characters::{first_name, parse_aliases};
use crate::choices::{display_label, CHARACTER_ROLES, RELATIONSHIP_TYPES, WORLD_CATEGORIES};
use crate::text::{clip_chars, truncate_chars};
use crate::types::DbId;

pub const CONTEXT_HEADER: &str = "[STORY CONTEXT - RELEVANT ENTITIES]:";
const DESCRIPTION_CHARS: usize = 200;
const MOTIVE_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct ContextCharacter {
    pub id: DbId,
    pub name: String,
    pub nickname: Option<String>,
    pub aliases: Option<String>,
    pub role: String,
    pub description: Option<String>,
    pub motivation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContextWorldEntry {
    pub id: DbId,
    pub title: String,
    pub category: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContextRelationship {
    pub character_a_id: DbId,
    pub character_b_id: DbId,
    pub relationship_type: String,
    pub strength: i32,
    pub description: Option<String>,
}

/// A matched entity, by index into the resolver's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextEntity {
    Character(usize),
    WorldEntry(usize),
}

struct Keyword {
    pattern: Regex,
    entity: ContextEntity,
}

pub struct ContextResolver {
    characters: Vec<ContextCharacter>,
    world_entries: Vec<ContextWorldEntry>,
    relationships: Vec<ContextRelationship>,
    keywords: Vec<Keyword>,
}

impl ContextResolver {
    pub fn new(
        characters: Vec<ContextCharacter>,
        world_entries: Vec<ContextWorldEntry>,
        relationships: Vec<ContextRelationship>,
    ) -> Self {
        let mut char_map: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut insert = |map: &mut HashMap<String, usize>, key: String, idx: usize| {
            if key.is_empty() {
                return;
            }
            if map.insert(key.clone(), idx).is_none() {
                order.push(key);
            }
        };

        for (idx, c) in characters.iter().enumerate() {
            insert(&mut char_map, c.name.trim().to_lowercase(), idx);
            if let Some(aliases) = &c.aliases {
                for alias in parse_aliases(aliases) {
                    insert(&mut char_map, alias.to_lowercase(), idx);
                }
            }
            if let Some(nick) = &c.nickname {
                insert(&mut char_map, nick.trim().to_lowercase(), idx);
            }
        }
        // First names only fill gaps left by explicit keys.
        for (idx, c) in characters.iter().enumerate() {
            if let Some(first) = first_name(&c.name) {
                let key = first.to_lowercase();
                if !char_map.contains_key(&key) {
                    insert(&mut char_map, key, idx);
                }
            }
        }

        let mut keywords: Vec<Keyword> = order
            .into_iter()
            .filter_map(|key| {
                let idx = *char_map.get(&key)?;
                keyword(&key, ContextEntity::Character(idx))
            })
            .collect();

        let mut seen_titles = HashMap::new();
        for (idx, w) in world_entries.iter().enumerate() {
            let key = w.title.trim().to_lowercase();
            if key.is_empty() || seen_titles.insert(key.clone(), idx).is_some() {
                continue;
            }
            keywords.extend(keyword(&key, ContextEntity::WorldEntry(idx)));
        }

        Self {
            characters,
            world_entries,
            relationships,
            keywords,
        }
    }

    /// Find every entity mentioned in `text`, characters first, each group
    /// ordered by first mention.
    pub fn scan_text(&self, text: &str) -> Vec<ContextEntity> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let lowered = text.to_lowercase();

        let mut first_seen: HashMap<ContextEntity, usize> = HashMap::new();
        for kw in &self.keywords {
            if let Some(m) = kw.pattern.find(&lowered) {
                first_seen
                    .entry(kw.entity)
                    .and_modify(|pos| *pos = (*pos).min(m.start()))
                    .or_insert(m.start());
            }
        }

        let mut found: Vec<(ContextEntity, usize)> = first_seen.into_iter().collect();
        found.sort_by_key(|(entity, pos)| match entity {
            ContextEntity::Character(i) => (0, *pos, *i),
            ContextEntity::WorldEntry(i) => (1, *pos, *i),
        });
        found.into_iter().map(|(entity, _)| entity).collect()
    }

    /// Ids of the characters among `entities`.
    pub fn character_ids(&self, entities: &[ContextEntity]) -> Vec<DbId> {
        entities
            .iter()
            .filter_map(|e| match e {
                ContextEntity::Character(i) => Some(self.characters[*i].id),
                ContextEntity::WorldEntry(_) => None,
            })
            .collect()
    }

    /// Render matched entities as a prompt block. Empty input renders "".
    pub fn format_context(&self, entities: &[ContextEntity]) -> String {
        if entities.is_empty() {
            return String::new();
        }
        let mut lines = vec![CONTEXT_HEADER.to_string()];

        for entity in entities {
            match entity {
                ContextEntity::Character(i) => lines.push(self.character_line(&self.characters[*i])),
                ContextEntity::WorldEntry(i) => lines.push(world_line(&self.world_entries[*i])),
            }
        }

        let matched = self.character_ids(entities);
        for rel in &self.relationships {
            if matched.contains(&rel.character_a_id) && matched.contains(&rel.character_b_id) {
                if let Some(line) = self.relationship_line(rel) {
                    lines.push(line);
                }
            }
        }

        lines.join("\n")
    }

    /// Scan a question plus optional scene text and render the result.
    pub fn context_for_query(&self, query: &str, scene_content: Option<&str>) -> String {
        let combined = format!("{query}\n{}", scene_content.unwrap_or_default());
        let entities = self.scan_text(&combined);
        self.format_context(&entities)
    }

    fn character_line(&self, c: &ContextCharacter) -> String {
        let mut info = format!("- CHARACTER: {}", c.name);
        if !c.role.is_empty() {
            info.push_str(&format!(" ({})", display_label(CHARACTER_ROLES, &c.role)));
        }
        if let Some(desc) = non_empty(&c.description) {
            info.push_str(&format!(". Desc: {}", truncate_chars(desc, DESCRIPTION_CHARS)));
        }
        if let Some(motive) = non_empty(&c.motivation) {
            info.push_str(&format!(". Motive: {}", clip_chars(motive, MOTIVE_CHARS)));
        }
        info
    }

    fn relationship_line(&self, rel: &ContextRelationship) -> Option<String> {
        let name_of = |id: DbId| self.characters.iter().find(|c| c.id == id).map(|c| c.name.as_str());
        let a = name_of(rel.character_a_id)?;
        let b = name_of(rel.character_b_id)?;
        let mut line = format!(
            "- RELATIONSHIP: {a} <-> {b} ({}, strength {}/10)",
            display_label(RELATIONSHIP_TYPES, &rel.relationship_type),
            rel.strength
        );
        if let Some(desc) = non_empty(&rel.description) {
            line.push_str(&format!(": {}", truncate_chars(desc, DESCRIPTION_CHARS)));
        }
        Some(line)
    }
}

fn world_line(w: &ContextWorldEntry) -> String {
    let mut info = format!(
        "- WORLD INFO ({}): {}",
        display_label(WORLD_CATEGORIES, &w.category),
        w.title
    );
    if let Some(content) = non_empty(&w.content) {
        info.push_str(&format!(". Details: {}", truncate_chars(content, DESCRIPTION_CHARS)));
    }
    info
}

fn keyword(key: &str, entity: ContextEntity) -> Option<Keyword> {
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(key))).ok()?;
    Some(Keyword { pattern, entity })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: DbId, name: &str, nickname: Option<&str>, aliases: Option<&str>) -> ContextCharacter {
        ContextCharacter {
            id,
            name: name.to_string(),
            nickname: nickname.map(String::from),
            aliases: aliases.map(String::from),
            role: "protagonist".to_string(),
            description: Some("A sharp-witted woman.".to_string()),
            motivation: Some("m".repeat(150)),
        }
    }

    fn resolver() -> ContextResolver {
        ContextResolver::new(
            vec![
                character(1, "Elizabeth Bennet", Some("Lizzy"), Some("Eliza")),
                character(2, "Fitzwilliam Darcy", None, Some("Mr. Darcy, Darcy")),
                character(3, "Cat", None, None),
            ],
            vec![ContextWorldEntry {
                id: 10,
                title: "Pemberley".to_string(),
                category: "location".to_string(),
                content: Some("x".repeat(250)),
            }],
            vec![ContextRelationship {
                character_a_id: 1,
                character_b_id: 2,
                relationship_type: "romantic".to_string(),
                strength: 8,
                description: Some("Pride meets prejudice.".to_string()),
            }],
        )
    }

    #[test]
    fn matches_whole_words_only() {
        let r = resolver();
        assert!(r.scan_text("They tried to catch it.").is_empty());
        assert_eq!(r.scan_text("The cat sat."), vec![ContextEntity::Character(2)]);
    }

    #[test]
    fn matches_nicknames_aliases_and_first_names() {
        let r = resolver();
        assert_eq!(r.scan_text("Lizzy laughed"), vec![ContextEntity::Character(0)]);
        assert_eq!(r.scan_text("darcy frowned"), vec![ContextEntity::Character(1)]);
        assert_eq!(r.scan_text("Elizabeth walked"), vec![ContextEntity::Character(0)]);
    }

    #[test]
    fn characters_come_before_world_entries_in_mention_order() {
        let r = resolver();
        let found = r.scan_text("At Pemberley, Darcy met Eliza.");
        assert_eq!(
            found,
            vec![
                ContextEntity::Character(1),
                ContextEntity::Character(0),
                ContextEntity::WorldEntry(0),
            ]
        );
    }

    #[test]
    fn empty_text_yields_empty_context() {
        let r = resolver();
        assert!(r.scan_text("").is_empty());
        assert_eq!(r.format_context(&[]), "");
        assert_eq!(r.context_for_query("nothing relevant", None), "");
    }

    #[test]
    fn formats_entities_and_relationships() {
        let r = resolver();
        let text = r.context_for_query("What does Lizzy think of Darcy?", Some("At Pemberley"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CONTEXT_HEADER);
        assert_eq!(
            lines[1],
            format!(
                "- CHARACTER: Elizabeth Bennet (Protagonist). Desc: A sharp-witted woman.. Motive: {}",
                "m".repeat(100)
            )
        );
        assert!(lines[3].starts_with("- WORLD INFO (Location): Pemberley. Details: "));
        assert!(lines[3].ends_with(".."));
        assert_eq!(
            lines[4],
            "- RELATIONSHIP: Elizabeth Bennet <-> Fitzwilliam Darcy (Romantic, strength 8/10): Pride meets prejudice."
        );
    }

    #[test]
    fn first_name_never_overrides_explicit_keys() {
        let r = ContextResolver::new(
            vec![
                character(1, "Anna", None, None),
                character(2, "Anna Karenina", None, None),
            ],
            vec![],
            vec![],
        );
        assert_eq!(r.scan_text("anna"), vec![ContextEntity::Character(0)]);
    }
}
