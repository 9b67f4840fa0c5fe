//! Deep scan: refresh a book's recurring characters from their scenes,
//! then re-run relationship synthesis for every co-occurring pair.
//!
//! The book status is never changed; only progress and message move.

use storybible_core::import_status::{
    deep_scan_character_progress, deep_scan_pair_progress, pair_message, DeepScanSummary,
    DEEP_SCAN_CHARACTER_SHARE, MSG_DEEP_SCAN_CHARACTERS, MSG_DEEP_SCAN_INTERRUPTED,
    PROGRESS_COMPLETE, PROGRESS_START,
};
use storybible_core::relationships::render_event_text;
use storybible_core::types::DbId;
use storybible_db::models::character::UpdateCharacter;
use storybible_db::repositories::{BookRepo, CharacterRepo, EventRepo};
use storybible_llm::{complete_json, CompletionRequest};

use crate::drafts::character_refresh;
use crate::error::PipelineError;
use crate::progress::BookProgress;
use crate::relationships::analyze_pair;
use crate::{prompts, PipelineContext};

/// A character must appear in this many of the book's events to be refreshed.
pub const MIN_CHARACTER_EVENTS: i64 = 2;
pub const MAX_CHARACTERS: i64 = 25;
/// Scene snippets shown to the model per character.
pub const SCENES_PER_CHARACTER: i64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct DeepScanJob {
    pub user_id: DbId,
    pub book_id: DbId,
}

/// Run a deep scan, recording cancellation and failure on the book.
pub async fn run_deep_scan(ctx: &PipelineContext, job: DeepScanJob) -> Result<DeepScanSummary, PipelineError> {
    let progress = BookProgress::new(&ctx.pool, job.book_id);
    let result = execute_deep_scan(ctx, job).await;
    let note = match &result {
        Ok(summary) => {
            tracing::info!(book_id = job.book_id, ?summary, "Deep scan finished");
            None
        }
        Err(PipelineError::Cancelled) => Some(MSG_DEEP_SCAN_INTERRUPTED.to_string()),
        Err(err) => {
            tracing::error!(book_id = job.book_id, error = %err, "Deep scan failed");
            Some(format!("Deep scan failed: {err}"))
        }
    };
    if let Some(note) = note {
        if let Err(e) = progress.message(None, &note).await {
            tracing::error!(book_id = job.book_id, error = %e, "Failed to record deep scan outcome");
        }
    }
    result
}

pub async fn execute_deep_scan(ctx: &PipelineContext, job: DeepScanJob) -> Result<DeepScanSummary, PipelineError> {
    let DeepScanJob { user_id, book_id } = job;
    BookRepo::find_by_id(&ctx.pool, user_id, book_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("book", book_id))?;

    let progress = BookProgress::new(&ctx.pool, book_id);
    let mut summary = DeepScanSummary::default();

    progress.report(PROGRESS_START, MSG_DEEP_SCAN_CHARACTERS).await?;
    let appearances =
        EventRepo::frequent_characters(&ctx.pool, book_id, MIN_CHARACTER_EVENTS, MAX_CHARACTERS).await?;
    for (i, appearance) in appearances.iter().enumerate() {
        ctx.check_cancelled()?;
        match refresh_character(ctx, user_id, book_id, appearance.character_id).await {
            Ok(true) => summary.characters_refreshed += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(
                book_id,
                character_id = appearance.character_id,
                error = %e,
                "Character refresh failed"
            ),
        }
        progress
            .report(deep_scan_character_progress(i + 1, appearances.len()), MSG_DEEP_SCAN_CHARACTERS)
            .await?;
    }

    let pairs = EventRepo::co_occurring_pairs(&ctx.pool, book_id).await?;
    progress
        .report(DEEP_SCAN_CHARACTER_SHARE, &pair_message(1, pairs.len().max(1)))
        .await?;
    for (i, pair) in pairs.iter().enumerate() {
        ctx.check_cancelled()?;
        progress
            .report(deep_scan_pair_progress(i, pairs.len()), &pair_message(i + 1, pairs.len()))
            .await?;
        let result = analyze_pair(
            &ctx.pool,
            ctx.llm.as_ref(),
            user_id,
            book_id,
            pair.character_a_id,
            pair.character_b_id,
        )
        .await;
        match result {
            Ok(_) => summary.pairs_analyzed += 1,
            Err(e) => {
                tracing::warn!(
                    book_id,
                    a_id = pair.character_a_id,
                    b_id = pair.character_b_id,
                    error = %e,
                    "Pair analysis failed"
                );
                summary.pairs_failed += 1;
            }
        }
    }

    progress.report(PROGRESS_COMPLETE, &summary.message()).await?;
    Ok(summary)
}

/// Refresh one character from their scenes. Returns whether anything was
/// written.
async fn refresh_character(
    ctx: &PipelineContext,
    user_id: DbId,
    book_id: DbId,
    character_id: DbId,
) -> Result<bool, PipelineError> {
    let Some(character) = CharacterRepo::find_by_id(&ctx.pool, user_id, character_id).await? else {
        return Ok(false);
    };
    let scenes =
        EventRepo::scenes_for_character(&ctx.pool, book_id, character_id, SCENES_PER_CHARACTER).await?;
    let texts: Vec<String> = scenes
        .iter()
        .map(|s| render_event_text(&s.title, Some(&s.description), Some(&s.location), Some(&s.content_html)))
        .collect();

    let request = CompletionRequest::new(prompts::character_refresh(
        &character.name,
        &character.role,
        &character.description,
        &texts,
    ))
    .with_system(prompts::EDITOR_SYSTEM)
    .json();
    let Some(value) = complete_json(ctx.llm.as_ref(), "character_refresh", &request).await else {
        return Ok(false);
    };
    let refresh = character_refresh(&value);
    if refresh.is_empty() {
        return Ok(false);
    }

    let update = UpdateCharacter {
        description: refresh.description,
        traits: refresh.traits,
        motivation: refresh.motivation,
        goals: refresh.goals,
        ..Default::default()
    };
    let updated = CharacterRepo::update(&ctx.pool, user_id, character_id, &update).await?;
    tracing::debug!(book_id, character_id, "Character refreshed");
    Ok(updated.is_some())
}
