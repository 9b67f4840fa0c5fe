//! Prompt templates for every LLM task.

use storybible_core::chapters::Chunk;
use storybible_core::choices::{
    display_label, CHARACTER_ROLES, EMOTIONAL_TONES, RELATIONSHIP_TYPES, STORY_BEATS,
};
use storybible_core::focus::FOCUS_TASK_COUNT;

pub const EDITOR_SYSTEM: &str =
    "You are a meticulous developmental editor building a story bible for a novelist. \
     Answer only with valid JSON matching the requested schema.";

pub const CONSULTANT_SYSTEM: &str =
    "You are a story consultant for a novelist. Use the story context provided to keep \
     answers consistent with established characters, relationships and world details. \
     Be specific and concise.";

fn values(choices: &[(&str, &str)]) -> String {
    choices
        .iter()
        .map(|(v, _)| *v)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Character pass over the opening of a manuscript.
pub fn character_extraction(sample: &str) -> String {
    format!(
        "Identify the named characters in this manuscript excerpt.\n\
         Return JSON: {{\"characters\": [{{\"name\": str, \"aliases\": [str], \"role\": one of \
         [{roles}], \"description\": str, \"traits\": str, \"motivation\": str}}]}}\n\
         Use the fullest form of each name as \"name\" and list every other way the text \
         refers to them under \"aliases\". Skip unnamed extras.\n\n\
         MANUSCRIPT:\n{sample}",
        roles = values(CHARACTER_ROLES),
    )
}

/// One import batch: several chunks, each to become a chapter with events.
pub fn chapter_batch(chunks: &[Chunk], known_characters: &[String]) -> String {
    let cast = if known_characters.is_empty() {
        "(none identified yet)".to_string()
    } else {
        known_characters.join(", ")
    };
    let body: Vec<String> = chunks
        .iter()
        .map(|c| {
            format!(
                "=== CHUNK {index} ({title}) ===\n{text}",
                index = c.index,
                title = c.display_title(),
                text = c.text
            )
        })
        .collect();
    format!(
        "Break each manuscript chunk below into a chapter summary and its key scenes.\n\
         Return JSON: {{\"chapters\": [{{\"chunk_index\": int, \"title\": str, \"summary\": str, \
         \"events\": [{{\"title\": str, \"description\": str, \"location\": str, \
         \"story_date\": str, \"characters\": [str], \"pov\": str, \"emotional_tone\": one of \
         [{tones}], \"story_beat\": one of [{beats}] or \"\", \"tension_level\": 1-10}}]}}]}}\n\
         Return one chapter per chunk, using the chunk index shown in its header.\n\
         Refer to characters by these names where they apply: {cast}\n\n{body}",
        tones = values(EMOTIONAL_TONES),
        beats = values(STORY_BEATS),
        body = body.join("\n\n"),
    )
}

/// Summary of one chronological batch of scenes shared by two characters.
pub fn interaction_summary(name_a: &str, name_b: &str, batch: usize, total: usize, scenes: &[String]) -> String {
    format!(
        "Summarise how {name_a} and {name_b} interact across these scenes \
         (part {part} of {total}, in story order). Focus on what changes between them: \
         trust, conflict, secrets, turning points. Plain prose, at most 200 words.\n\n{scenes}",
        part = batch + 1,
        scenes = scenes.join("\n\n"),
    )
}

/// The character facts shown to the relationship synthesiser.
pub struct CharacterBrief<'a> {
    pub name: &'a str,
    pub role: &'a str,
    pub traits: &'a str,
    pub motivation: &'a str,
}

impl CharacterBrief<'_> {
    fn render(&self) -> String {
        format!(
            "{} ({}). Traits: {}. Motivation: {}",
            self.name,
            display_label(CHARACTER_ROLES, self.role),
            self.traits,
            self.motivation
        )
    }
}

/// Full relationship profile from the batch summaries.
pub fn relationship_profile(a: &CharacterBrief<'_>, b: &CharacterBrief<'_>, summaries: &[String]) -> String {
    let arc: Vec<String> = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Part {}: {}", i + 1, s))
        .collect();
    format!(
        "Analyse the relationship between two characters.\n\
         CHARACTER A: {a}\nCHARACTER B: {b}\n\n\
         RELATIONSHIP ARC:\n{arc}\n\n\
         Return JSON: {{\"type\": one of [{types}], \"description\": str, \"strength\": 1-10, \
         \"trust_level\": 1-10, \"power_dynamic\": str, \"relationship_status\": str, \
         \"visibility\": str, \"conflict_source\": str, \"character_a_wants\": str, \
         \"character_b_wants\": str, \"evolution\": str, \"shared_secret\": str, \
         \"first_impression\": str, \"vulnerability\": str, \"major_shared_moments\": str, \
         \"predictability\": 1-10}}",
        a = a.render(),
        b = b.render(),
        arc = arc.join("\n"),
        types = values(RELATIONSHIP_TYPES),
    )
}

/// Deep-scan refresh of one character from their scenes.
pub fn character_refresh(name: &str, role: &str, current_description: &str, scenes: &[String]) -> String {
    format!(
        "Update the story bible entry for {name} ({role}) from the scenes below.\n\
         Current description: {current}\n\
         Return JSON: {{\"description\": str, \"traits\": str, \"motivation\": str, \"goals\": str}}. \
         Leave a field empty if the scenes say nothing new about it.\n\n{scenes}",
        role = display_label(CHARACTER_ROLES, role),
        current = if current_description.is_empty() { "(none)" } else { current_description },
        scenes = scenes.join("\n\n"),
    )
}

/// Consultant question with resolved story context.
pub fn consultant(query: &str, context: &str, scene: Option<&str>, chapter_packet: Option<&str>) -> String {
    let mut prompt = String::new();
    if !context.is_empty() {
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }
    if let Some(packet) = chapter_packet {
        prompt.push_str("[CHAPTER CONTEXT]:\n");
        prompt.push_str(packet);
        prompt.push_str("\n\n");
    }
    if let Some(scene) = scene.filter(|s| !s.trim().is_empty()) {
        prompt.push_str("[CURRENT SCENE]:\n");
        prompt.push_str(scene);
        prompt.push_str("\n\n");
    }
    prompt.push_str("QUESTION: ");
    prompt.push_str(query);
    prompt
}

/// Daily writing tasks from a digest of the story bible.
pub fn focus_tasks(digest: &str) -> String {
    format!(
        "Suggest {FOCUS_TASK_COUNT} concrete writing tasks for today, each achievable in under \
         an hour, based on the state of this story bible.\n\
         Return JSON: {{\"tasks\": [str]}}\n\n{digest}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, title: Option<&str>, text: &str) -> Chunk {
        Chunk {
            index,
            heading: None,
            title: title.map(String::from),
            text: text.to_string(),
        }
    }

    #[test]
    fn batch_prompt_labels_chunks() {
        let prompt = chapter_batch(
            &[chunk(3, Some("The Fall"), "It rained."), chunk(4, None, "Dawn.")],
            &["Elara Voss".to_string()],
        );
        assert!(prompt.contains("=== CHUNK 3 (The Fall) ===\nIt rained."));
        assert!(prompt.contains("=== CHUNK 4 (Part 5) ==="));
        assert!(prompt.contains("Elara Voss"));
        assert!(prompt.contains("tension, action"));
    }

    #[test]
    fn consultant_prompt_sections() {
        let prompt = consultant("Is Bram lying?", "[STORY CONTEXT - RELEVANT ENTITIES]:\n- x", Some("Bram smiled."), None);
        assert!(prompt.starts_with("[STORY CONTEXT"));
        assert!(prompt.contains("[CURRENT SCENE]:\nBram smiled."));
        assert!(prompt.ends_with("QUESTION: Is Bram lying?"));
        assert_eq!(consultant("Q", "", None, None), "QUESTION: Q");
    }

    #[test]
    fn profile_prompt_numbers_parts() {
        let a = CharacterBrief { name: "Elara", role: "protagonist", traits: "brave", motivation: "home" };
        let b = CharacterBrief { name: "Bram", role: "minor", traits: "", motivation: "" };
        let prompt = relationship_profile(&a, &b, &["Met.".into(), "Fought.".into()]);
        assert!(prompt.contains("CHARACTER A: Elara (Protagonist)"));
        assert!(prompt.contains("Part 2: Fought."));
    }
}
