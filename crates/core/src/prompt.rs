//! Co-author prompt packet for a single chapter.

use crate::choices::{display_label, CHARACTER_ROLES, EMOTIONAL_TONES};
use crate::text::tail_chars;

pub const DEFAULT_INSTRUCTION: &str = "Continue the story naturally.";

/// Characters of manuscript text included at the end of the packet.
pub const MANUSCRIPT_TAIL_CHARS: usize = 2_000;

#[derive(Debug, Clone)]
pub struct PromptCharacter {
    pub name: String,
    pub role: String,
    pub traits: Option<String>,
    pub motivation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PromptBeat {
    pub title: String,
    pub description: Option<String>,
    pub emotional_tone: String,
}

/// Everything the packet needs about a chapter and its book.
#[derive(Debug, Clone)]
pub struct ChapterContext {
    pub book_title: String,
    pub book_description: Option<String>,
    pub series_order: i32,
    pub chapter_number: i32,
    pub chapter_title: String,
    pub chapter_description: Option<String>,
    pub characters: Vec<PromptCharacter>,
    /// Chapter events in sequence order.
    pub beats: Vec<PromptBeat>,
}

impl ChapterContext {
    fn character_block(&self) -> String {
        if self.characters.is_empty() {
            return "CHARACTERS: (No specific characters tagged in this chapter yet. Use general book context.)"
                .to_string();
        }
        let lines: Vec<String> = self
            .characters
            .iter()
            .map(|c| {
                format!(
                    "- {} ({}): {}. Motivation: {}",
                    c.name,
                    display_label(CHARACTER_ROLES, &c.role),
                    c.traits.as_deref().unwrap_or_default(),
                    c.motivation.as_deref().unwrap_or_default()
                )
            })
            .collect();
        format!("CHARACTERS IN SCENE:\n{}", lines.join("\n"))
    }

    fn beat_block(&self) -> String {
        if self.beats.is_empty() {
            return String::new();
        }
        let lines: Vec<String> = self
            .beats
            .iter()
            .map(|b| {
                format!(
                    "- {}: {} (Tone: {})",
                    b.title,
                    b.description.as_deref().unwrap_or_default(),
                    display_label(EMOTIONAL_TONES, &b.emotional_tone)
                )
            })
            .collect();
        format!("CHAPTER OUTLINE / BEATS:\n{}", lines.join("\n"))
    }
}

/// Render the prompt sent to the model for chapter assistance.
///
/// Only the last [`MANUSCRIPT_TAIL_CHARS`] characters of `current_text`
/// are included. A blank `instruction` falls back to [`DEFAULT_INSTRUCTION`].
pub fn build_prompt_packet(ctx: &ChapterContext, current_text: &str, instruction: Option<&str>) -> String {
    let instruction = instruction
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or(DEFAULT_INSTRUCTION);

    format!(
        "You are an expert co-author assisting with a novel.\n\
         BOOK: {book} (Book {series})\n\
         PREMISE: {premise}\n\
         CHAPTER {number}: {chapter}\n\
         SUMMARY: {summary}\n\
         \n\
         {characters}\n\
         \n\
         {beats}\n\
         \n\
         TASK: {instruction}\n\
         Ensure the writing style matches the context. Maintain character voice and consistency.\n\
         \n\
         CURRENT MANUSCRIPT TEXT:\n\
         {tail}\n\
         (End of current text)\n\
         \n\
         GENERATION:\n",
        book = ctx.book_title,
        series = ctx.series_order,
        premise = ctx.book_description.as_deref().unwrap_or_default(),
        number = ctx.chapter_number,
        chapter = ctx.chapter_title,
        summary = ctx.chapter_description.as_deref().unwrap_or_default(),
        characters = ctx.character_block(),
        beats = ctx.beat_block(),
        tail = tail_chars(current_text, MANUSCRIPT_TAIL_CHARS),
    )
}
