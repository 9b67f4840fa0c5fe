//! Manuscript import: characters first, then chapters and their scenes in
//! batches, written incrementally with progress on the book row.
//!
//! Model failures never abort the run. A character pass that yields
//! nothing is skipped; a batch the model cannot handle still stores its
//! chapters (raw text, heading title) but no scenes, and is counted as
//! skipped in the final message.

use std::collections::HashSet;

use storybible_core::chapters::{split_manuscript, Chunk};
use storybible_core::characters::{find_match, merge_aliases, resolve_name};
use storybible_core::choices::{BOOK_STATUS_DRAFTING, BOOK_STATUS_IMPORTING};
use storybible_core::import_status::{
    batch_message, batch_progress, ImportSummary, IMPORT_BATCH_SIZE, MSG_IDENTIFYING_CHARACTERS,
    MSG_IMPORT_INTERRUPTED, PROGRESS_BATCHES_DONE, PROGRESS_CHARACTERS_DONE, PROGRESS_COMPLETE,
    PROGRESS_EXTRACTED,
};
use storybible_core::text::{clip_chars, count_words};
use storybible_core::types::DbId;
use storybible_db::models::chapter::UpsertChapter;
use storybible_db::models::character::{Character, CreateCharacter, UpdateCharacter};
use storybible_db::models::event::CreateEvent;
use storybible_db::repositories::{BookRepo, ChapterRepo, CharacterRepo, EventRepo};
use storybible_llm::{complete_json, CompletionRequest};

use crate::drafts::{chapter_drafts, character_candidates, ChapterDraft, CharacterCandidate, EventDraft};
use crate::error::PipelineError;
use crate::progress::BookProgress;
use crate::prompts;
use crate::PipelineContext;

/// Leading characters of the manuscript shown to the character pass.
pub const CHARACTER_SAMPLE_CHARS: usize = 24_000;

/// An extracted manuscript waiting to be imported into a book.
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub user_id: DbId,
    pub book_id: DbId,
    pub text: String,
}

/// Run an import to completion, recording the outcome on the book.
///
/// Cancellation leaves progress where it was with
/// [`MSG_IMPORT_INTERRUPTED`]; other errors put the book back to
/// `drafting` with the error as its message.
pub async fn run_import(ctx: &PipelineContext, job: ImportJob) -> Result<ImportSummary, PipelineError> {
    let book_id = job.book_id;
    let progress = BookProgress::new(&ctx.pool, book_id);
    let result = execute_import(ctx, &job).await;
    match &result {
        Ok(summary) => tracing::info!(book_id, ?summary, "Import finished"),
        Err(PipelineError::Cancelled) => {
            tracing::warn!(book_id, "Import cancelled");
            if let Err(e) = progress.message(Some(BOOK_STATUS_DRAFTING), MSG_IMPORT_INTERRUPTED).await {
                tracing::error!(book_id, error = %e, "Failed to record interrupted import");
            }
        }
        Err(err) => {
            tracing::error!(book_id, error = %err, "Import failed");
            let message = format!("Import failed: {err}");
            if let Err(e) = progress.message(Some(BOOK_STATUS_DRAFTING), &message).await {
                tracing::error!(book_id, error = %e, "Failed to record import failure");
            }
        }
    }
    result
}

/// The import stages without outcome bookkeeping.
pub async fn execute_import(ctx: &PipelineContext, job: &ImportJob) -> Result<ImportSummary, PipelineError> {
    let progress = BookProgress::new(&ctx.pool, job.book_id);
    let mut summary = ImportSummary::default();

    progress
        .report_status(BOOK_STATUS_IMPORTING, PROGRESS_EXTRACTED, MSG_IDENTIFYING_CHARACTERS)
        .await?;
    ctx.check_cancelled()?;

    match identify_characters(ctx, job, &mut summary).await {
        Ok(()) => {}
        Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
        Err(e) => tracing::warn!(book_id = job.book_id, error = %e, "Character pass skipped"),
    }

    let chunks = split_manuscript(&job.text);
    let batches: Vec<&[Chunk]> = chunks.chunks(IMPORT_BATCH_SIZE).collect();
    let total = batches.len();
    progress
        .report(PROGRESS_CHARACTERS_DONE, &batch_message(1, total.max(1)))
        .await?;

    let characters = CharacterRepo::list_by_user(&ctx.pool, job.user_id).await?;

    for (i, batch) in batches.iter().enumerate() {
        ctx.check_cancelled()?;
        progress.report(batch_progress(i, total), &batch_message(i + 1, total)).await?;

        match import_batch(ctx, job, batch, &characters).await {
            Ok(outcome) => {
                summary.chapters += outcome.chapters;
                summary.events += outcome.events;
                if outcome.skipped {
                    summary.skipped_batches += 1;
                }
            }
            Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(e) => {
                tracing::warn!(book_id = job.book_id, batch = i + 1, error = %e, "Batch skipped");
                summary.skipped_batches += 1;
            }
        }
    }

    progress.report(PROGRESS_BATCHES_DONE, "Finalizing import").await?;
    let words = BookRepo::recompute_word_count(&ctx.pool, job.book_id).await?;
    tracing::debug!(book_id = job.book_id, words, "Word count recomputed");

    progress
        .report_status(BOOK_STATUS_DRAFTING, PROGRESS_COMPLETE, &summary.message())
        .await?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

async fn identify_characters(
    ctx: &PipelineContext,
    job: &ImportJob,
    summary: &mut ImportSummary,
) -> Result<(), PipelineError> {
    let sample = clip_chars(&job.text, CHARACTER_SAMPLE_CHARS);
    let request = CompletionRequest::new(prompts::character_extraction(sample))
        .with_system(prompts::EDITOR_SYSTEM)
        .json();
    let Some(value) = complete_json(ctx.llm.as_ref(), "character_extraction", &request).await else {
        tracing::warn!(book_id = job.book_id, "No characters returned, continuing without");
        return Ok(());
    };
    let candidates = character_candidates(&value);
    tracing::debug!(book_id = job.book_id, candidates = candidates.len(), "Character candidates");

    let mut existing = CharacterRepo::list_by_user(&ctx.pool, job.user_id).await?;
    for candidate in &candidates {
        ctx.check_cancelled()?;
        let matched = find_match(&candidate.name, &candidate.aliases, &existing).map(|c| c.id);
        match matched {
            Some(id) => {
                if let Some(pos) = existing.iter().position(|c| c.id == id) {
                    if let Some(updated) = merge_candidate(ctx, job.user_id, &existing[pos], candidate).await? {
                        existing[pos] = updated;
                    }
                }
                summary.characters_merged += 1;
            }
            None => {
                let created = CharacterRepo::create(&ctx.pool, job.user_id, &new_character(job.book_id, candidate)).await?;
                tracing::debug!(character_id = created.id, name = %created.name, "Character created");
                existing.push(created);
                summary.characters_created += 1;
            }
        }
    }
    Ok(())
}

fn new_character(book_id: DbId, candidate: &CharacterCandidate) -> CreateCharacter {
    let aliases = candidate.aliases.join(", ");
    CreateCharacter {
        name: candidate.name.clone(),
        aliases: (!aliases.is_empty()).then_some(aliases),
        role: Some(candidate.role.to_string()),
        description: Some(candidate.description.clone()),
        traits: Some(candidate.traits.clone()),
        motivation: Some(candidate.motivation.clone()),
        introduction_book_id: Some(book_id),
        ..Default::default()
    }
}

/// Merge new aliases and fill empty text fields of an existing character.
/// Returns the updated row, or `None` when nothing changed.
async fn merge_candidate(
    ctx: &PipelineContext,
    user_id: DbId,
    existing: &Character,
    candidate: &CharacterCandidate,
) -> Result<Option<Character>, PipelineError> {
    let incoming: Vec<String> = std::iter::once(candidate.name.clone())
        .chain(candidate.aliases.iter().cloned())
        .collect();
    let own = [existing.name.clone(), existing.nickname.clone()];
    let fill = |current: &str, new: &str| -> Option<String> {
        (current.trim().is_empty() && !new.trim().is_empty()).then(|| new.to_string())
    };

    let update = UpdateCharacter {
        aliases: merge_aliases(Some(existing.aliases.as_str()), &incoming, &own),
        description: fill(&existing.description, &candidate.description),
        traits: fill(&existing.traits, &candidate.traits),
        motivation: fill(&existing.motivation, &candidate.motivation),
        ..Default::default()
    };
    if update.aliases.is_none()
        && update.description.is_none()
        && update.traits.is_none()
        && update.motivation.is_none()
    {
        return Ok(None);
    }
    tracing::debug!(character_id = existing.id, name = %existing.name, "Character merged");
    Ok(CharacterRepo::update(&ctx.pool, user_id, existing.id, &update).await?)
}

// ---------------------------------------------------------------------------
// Chapter batches
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BatchOutcome {
    chapters: usize,
    events: usize,
    skipped: bool,
}

async fn import_batch(
    ctx: &PipelineContext,
    job: &ImportJob,
    batch: &[Chunk],
    characters: &[Character],
) -> Result<BatchOutcome, PipelineError> {
    let names: Vec<String> = characters.iter().map(|c| c.name.clone()).collect();
    let request = CompletionRequest::new(prompts::chapter_batch(batch, &names))
        .with_system(prompts::EDITOR_SYSTEM)
        .json()
        .with_max_tokens(8192);
    let drafts = complete_json(ctx.llm.as_ref(), "chapter_batch", &request)
        .await
        .map(|value| chapter_drafts(&value))
        .unwrap_or_default();

    let mut outcome = BatchOutcome {
        skipped: drafts.is_empty(),
        ..Default::default()
    };

    for (pos, chunk) in batch.iter().enumerate() {
        let draft = draft_for(&drafts, chunk, pos);
        let title = draft
            .map(|d| d.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| chunk.display_title());
        let chapter = ChapterRepo::upsert(
            &ctx.pool,
            &UpsertChapter {
                book_id: job.book_id,
                chapter_number: chunk.index as i32 + 1,
                title,
                description: draft.map(|d| d.summary.clone()).unwrap_or_default(),
                content: chunk.text.clone(),
                word_count: count_words(&chunk.text),
            },
        )
        .await?;
        outcome.chapters += 1;

        let Some(draft) = draft else { continue };
        for event in &draft.events {
            let input = event_input(job.book_id, chapter.id, event, characters);
            EventRepo::create(&ctx.pool, job.user_id, &input, 0).await?;
            outcome.events += 1;
        }
    }
    Ok(outcome)
}

/// Pair a chunk with its draft: by `chunk_index` when the model gave
/// indexes, else by position in the batch.
fn draft_for<'a>(drafts: &'a [ChapterDraft], chunk: &Chunk, pos: usize) -> Option<&'a ChapterDraft> {
    if drafts.iter().any(|d| d.chunk_index.is_some()) {
        drafts.iter().find(|d| d.chunk_index == Some(chunk.index))
    } else {
        drafts.get(pos)
    }
}

fn event_input(book_id: DbId, chapter_id: DbId, draft: &EventDraft, characters: &[Character]) -> CreateEvent {
    let mut seen = HashSet::new();
    let character_ids: Vec<DbId> = draft
        .characters
        .iter()
        .filter_map(|name| resolve_name(name, characters))
        .map(|c| c.id)
        .filter(|id| seen.insert(*id))
        .collect();
    let pov_character_id = draft
        .pov
        .as_deref()
        .and_then(|name| resolve_name(name, characters))
        .map(|c| c.id);

    CreateEvent {
        title: draft.title.clone(),
        book_id,
        chapter_id: Some(chapter_id),
        description: Some(draft.description.clone()),
        location: Some(draft.location.clone()),
        story_date: Some(draft.story_date.clone()),
        pov_character_id,
        emotional_tone: Some(draft.emotional_tone.to_string()),
        story_beat: Some(draft.story_beat.to_string()),
        tension_level: Some(draft.tension_level),
        character_ids: Some(character_ids),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize) -> Chunk {
        Chunk { index, heading: None, title: None, text: String::new() }
    }

    fn draft(index: Option<usize>, title: &str) -> ChapterDraft {
        ChapterDraft { chunk_index: index, title: title.into(), summary: String::new(), events: vec![] }
    }

    #[test]
    fn drafts_pair_by_index_when_given() {
        let drafts = vec![draft(Some(4), "Four"), draft(Some(3), "Three")];
        assert_eq!(draft_for(&drafts, &chunk(3), 0).map(|d| d.title.as_str()), Some("Three"));
        assert!(draft_for(&drafts, &chunk(5), 2).is_none());
    }

    #[test]
    fn drafts_pair_by_position_without_index() {
        let drafts = vec![draft(None, "A"), draft(None, "B")];
        assert_eq!(draft_for(&drafts, &chunk(7), 1).map(|d| d.title.as_str()), Some("B"));
        assert!(draft_for(&drafts, &chunk(8), 2).is_none());
    }
}
