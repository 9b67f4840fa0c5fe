//! Markdown export of one book's story bible.

use std::collections::HashMap;
use std::fmt::Write;

use sqlx::PgPool;
use storybible_core::choices::{display_label, CHARACTER_ROLES, EMOTIONAL_TONES, RELATIONSHIP_TYPES, WORLD_CATEGORIES};
use storybible_core::types::DbId;
use storybible_db::models::book::Book;
use storybible_db::models::chapter::Chapter;
use storybible_db::models::character::Character;
use storybible_db::models::event::{Event, EventFilter};
use storybible_db::models::relationship::CharacterRelationship;
use storybible_db::models::world_entry::{WorldEntry, WorldEntryFilter};
use storybible_db::repositories::{BookRepo, ChapterRepo, CharacterRepo, EventRepo, RelationshipRepo, WorldEntryRepo};

use crate::error::{AppError, AppResult};

pub struct StoryBible {
    pub book: Book,
    pub chapters: Vec<Chapter>,
    pub characters: Vec<Character>,
    pub events: Vec<Event>,
    pub relationships: Vec<CharacterRelationship>,
    pub world_entries: Vec<WorldEntry>,
}

impl StoryBible {
    pub async fn load(pool: &PgPool, user_id: DbId, book_id: DbId) -> AppResult<Self> {
        let book = BookRepo::find_by_id(pool, user_id, book_id)
            .await?
            .ok_or_else(|| AppError::not_found("book", book_id))?;
        let chapters = ChapterRepo::list_by_book(pool, book_id).await?;
        let characters = CharacterRepo::list_by_book(pool, book_id).await?;
        let filter = EventFilter {
            book_id: Some(book_id),
            ..Default::default()
        };
        let events = EventRepo::list(pool, user_id, &filter).await?;
        let in_book: Vec<DbId> = characters.iter().map(|c| c.id).collect();
        let relationships = RelationshipRepo::list_by_user(pool, user_id)
            .await?
            .into_iter()
            .filter(|r| in_book.contains(&r.character_a_id) && in_book.contains(&r.character_b_id))
            .collect();
        let world_filter = WorldEntryFilter {
            book_id: Some(book_id),
            ..Default::default()
        };
        let world_entries = WorldEntryRepo::list(pool, user_id, &world_filter).await?;

        Ok(Self {
            book,
            chapters,
            characters,
            events,
            relationships,
            world_entries,
        })
    }

    /// File name offered for download.
    pub fn filename(&self) -> String {
        let slug: String = self
            .book
            .title
            .chars()
            .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug.split('-').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("-");
        if slug.is_empty() {
            format!("book-{}-story-bible.md", self.book.id)
        } else {
            format!("{slug}-story-bible.md")
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let book = &self.book;
        let _ = writeln!(md, "# {}\n", book.title);
        let _ = writeln!(
            md,
            "Book {} · {} · {} / {} words\n",
            book.series_order, book.status, book.current_word_count, book.word_count_target
        );
        if !book.description.trim().is_empty() {
            let _ = writeln!(md, "{}\n", book.description.trim());
        }

        let names: HashMap<DbId, &str> = self.characters.iter().map(|c| (c.id, c.name.as_str())).collect();

        if !self.characters.is_empty() {
            md.push_str("## Characters\n\n");
            for c in &self.characters {
                let _ = writeln!(md, "### {} ({})\n", c.name, display_label(CHARACTER_ROLES, &c.role));
                for (label, value) in [
                    ("Also known as", c.aliases.as_str()),
                    ("Description", c.description.as_str()),
                    ("Traits", c.traits.as_str()),
                    ("Motivation", c.motivation.as_str()),
                    ("Goals", c.goals.as_str()),
                ] {
                    if !value.trim().is_empty() {
                        let _ = writeln!(md, "- **{label}:** {}", value.trim());
                    }
                }
                md.push('\n');
            }
        }

        if !self.relationships.is_empty() {
            md.push_str("## Relationships\n\n");
            for r in &self.relationships {
                let a = names.get(&r.character_a_id).copied().unwrap_or("?");
                let b = names.get(&r.character_b_id).copied().unwrap_or("?");
                let _ = write!(
                    md,
                    "- **{a} & {b}**: {} (strength {}/10, trust {}/10)",
                    display_label(RELATIONSHIP_TYPES, &r.relationship_type),
                    r.strength,
                    r.trust_level
                );
                if !r.description.trim().is_empty() {
                    let _ = write!(md, ". {}", r.description.trim());
                }
                md.push('\n');
            }
            md.push('\n');
        }

        if !self.chapters.is_empty() {
            md.push_str("## Chapters\n\n");
            for ch in &self.chapters {
                let _ = writeln!(md, "### {}. {}\n", ch.chapter_number, ch.title);
                if !ch.description.trim().is_empty() {
                    let _ = writeln!(md, "{}\n", ch.description.trim());
                }
                for e in self.events.iter().filter(|e| e.chapter_id == Some(ch.id)) {
                    self.write_event(&mut md, e, &names);
                }
                md.push('\n');
            }
        }

        let loose: Vec<&Event> = self.events.iter().filter(|e| e.chapter_id.is_none()).collect();
        if !loose.is_empty() {
            md.push_str("## Unassigned scenes\n\n");
            for e in loose {
                self.write_event(&mut md, e, &names);
            }
            md.push('\n');
        }

        if !self.world_entries.is_empty() {
            md.push_str("## World\n\n");
            for w in &self.world_entries {
                let _ = writeln!(md, "### {} ({})\n", w.title, display_label(WORLD_CATEGORIES, &w.category));
                if !w.content.trim().is_empty() {
                    let _ = writeln!(md, "{}\n", w.content.trim());
                }
            }
        }

        md
    }

    fn write_event(&self, md: &mut String, e: &Event, names: &HashMap<DbId, &str>) {
        let _ = write!(
            md,
            "- **{}** [{}, tension {}]",
            e.title,
            display_label(EMOTIONAL_TONES, &e.emotional_tone),
            e.tension_level
        );
        if let Some(pov) = e.pov_character_id.and_then(|id| names.get(&id)) {
            let _ = write!(md, " POV: {pov}.");
        }
        if !e.description.trim().is_empty() {
            let _ = write!(md, " {}", e.description.trim());
        }
        md.push('\n');
    }
}
