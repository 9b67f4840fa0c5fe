//! Interactive AI helpers: the story consultant, the chapter co-author and
//! daily focus tasks.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use storybible_core::context::{ContextCharacter, ContextRelationship, ContextResolver, ContextWorldEntry};
use storybible_core::error::CoreError;
use storybible_core::focus::{clean_tasks, default_tasks};
use storybible_core::prompt::{build_prompt_packet, ChapterContext, PromptBeat, PromptCharacter};
use storybible_core::text::truncate_chars;
use storybible_core::types::DbId;
use storybible_db::models::event::EventFilter;
use storybible_db::models::focus_task::FocusTask;
use storybible_db::models::world_entry::WorldEntryFilter;
use storybible_db::repositories::{
    BookRepo, ChapterRepo, CharacterRepo, EventRepo, FocusTaskRepo, RelationshipRepo, WorldEntryRepo,
};
use storybible_llm::{complete_json, complete_text, CompletionRequest, LlmClient};

use crate::drafts::task_lines;
use crate::error::PipelineError;
use crate::prompts;

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ---------------------------------------------------------------------------
// Consultant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ConsultRequest {
    pub query: String,
    pub scene_content: Option<String>,
    pub chapter_id: Option<DbId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultAnswer {
    pub answer: String,
    /// The resolved story context block sent with the question.
    pub context_used: String,
}

/// Build a resolver over everything the user has written down.
pub async fn story_resolver(pool: &PgPool, user_id: DbId) -> Result<ContextResolver, PipelineError> {
    let characters = CharacterRepo::list_by_user(pool, user_id)
        .await?
        .into_iter()
        .map(|c| ContextCharacter {
            id: c.id,
            nickname: non_empty(&c.nickname),
            aliases: non_empty(&c.aliases),
            description: non_empty(&c.description),
            motivation: non_empty(&c.motivation),
            name: c.name,
            role: c.role,
        })
        .collect();
    let world_entries = WorldEntryRepo::list(pool, user_id, &WorldEntryFilter::default())
        .await?
        .into_iter()
        .map(|w| ContextWorldEntry {
            id: w.id,
            content: non_empty(&w.content),
            title: w.title,
            category: w.category,
        })
        .collect();
    let relationships = RelationshipRepo::list_by_user(pool, user_id)
        .await?
        .into_iter()
        .map(|r| ContextRelationship {
            character_a_id: r.character_a_id,
            character_b_id: r.character_b_id,
            description: non_empty(&r.description),
            relationship_type: r.relationship_type,
            strength: r.strength,
        })
        .collect();
    Ok(ContextResolver::new(characters, world_entries, relationships))
}

/// Answer a story question with the resolved context.
pub async fn consult(
    pool: &PgPool,
    llm: &dyn LlmClient,
    user_id: DbId,
    request: &ConsultRequest,
) -> Result<ConsultAnswer, PipelineError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(CoreError::Validation("query must not be empty".into()).into());
    }
    let scene = request.scene_content.as_deref();

    let resolver = story_resolver(pool, user_id).await?;
    let context = resolver.context_for_query(query, scene);

    let packet = match request.chapter_id {
        Some(chapter_id) => {
            let ctx = chapter_context(pool, user_id, chapter_id).await?;
            Some(build_prompt_packet(&ctx, scene.unwrap_or_default(), Some(query)))
        }
        None => None,
    };

    let prompt = prompts::consultant(query, &context, scene, packet.as_deref());
    let req = CompletionRequest::new(prompt).with_system(prompts::CONSULTANT_SYSTEM);
    let answer = complete_text(llm, "consultant", &req)
        .await
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or(PipelineError::AiUnavailable)?;

    tracing::debug!(user_id, context_chars = context.len(), "Consultant answered");
    Ok(ConsultAnswer { answer, context_used: context })
}

// ---------------------------------------------------------------------------
// Chapter co-author
// ---------------------------------------------------------------------------

/// Gather the book, characters and beats of a chapter.
pub async fn chapter_context(pool: &PgPool, user_id: DbId, chapter_id: DbId) -> Result<ChapterContext, PipelineError> {
    let chapter = ChapterRepo::find_by_id(pool, user_id, chapter_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("chapter", chapter_id))?;
    let book = BookRepo::find_by_id(pool, user_id, chapter.book_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("book", chapter.book_id))?;

    let characters = CharacterRepo::list_by_chapter(pool, chapter.id)
        .await?
        .into_iter()
        .map(|c| PromptCharacter {
            traits: non_empty(&c.traits),
            motivation: non_empty(&c.motivation),
            name: c.name,
            role: c.role,
        })
        .collect();
    let filter = EventFilter {
        chapter_id: Some(chapter.id),
        ..Default::default()
    };
    let beats = EventRepo::list(pool, user_id, &filter)
        .await?
        .into_iter()
        .map(|e| PromptBeat {
            description: non_empty(&e.description),
            title: e.title,
            emotional_tone: e.emotional_tone,
        })
        .collect();

    Ok(ChapterContext {
        book_title: book.title,
        book_description: non_empty(&book.description),
        series_order: book.series_order,
        chapter_number: chapter.chapter_number,
        chapter_title: chapter.title,
        chapter_description: non_empty(&chapter.description),
        characters,
        beats,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistRequest {
    #[serde(default)]
    pub current_text: String,
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistReply {
    pub suggestion: String,
    pub prompt: String,
}

/// Ask the model to continue a chapter.
pub async fn chapter_assist(
    pool: &PgPool,
    llm: &dyn LlmClient,
    user_id: DbId,
    chapter_id: DbId,
    request: &AssistRequest,
) -> Result<AssistReply, PipelineError> {
    let ctx = chapter_context(pool, user_id, chapter_id).await?;
    let prompt = build_prompt_packet(&ctx, &request.current_text, request.instruction.as_deref());
    let req = CompletionRequest::new(prompt.clone()).with_temperature(0.8);
    let suggestion = complete_text(llm, "chapter_assist", &req)
        .await
        .ok_or(PipelineError::AiUnavailable)?;
    Ok(AssistReply { suggestion: suggestion.trim().to_string(), prompt })
}

// ---------------------------------------------------------------------------
// Focus tasks
// ---------------------------------------------------------------------------

const DIGEST_BOOKS: usize = 5;
const DIGEST_UNWRITTEN: i64 = 10;

/// Summarise the story bible for the focus-task prompt.
async fn story_digest(pool: &PgPool, user_id: DbId) -> Result<String, PipelineError> {
    let books = BookRepo::list_in_progress(pool, user_id).await?;
    let unwritten = EventRepo::list_unwritten(pool, user_id, DIGEST_UNWRITTEN).await?;

    let mut digest = String::from("BOOKS IN PROGRESS:\n");
    if books.is_empty() {
        digest.push_str("- (none)\n");
    }
    for book in books.iter().take(DIGEST_BOOKS) {
        digest.push_str(&format!(
            "- {} ({}, {} of {} words)\n",
            book.title, book.status, book.current_word_count, book.word_count_target
        ));
    }
    digest.push_str("\nUNWRITTEN SCENES:\n");
    if unwritten.is_empty() {
        digest.push_str("- (none)\n");
    }
    for event in &unwritten {
        digest.push_str(&format!("- {}: {}\n", event.title, truncate_chars(&event.description, 150)));
    }
    Ok(digest)
}

/// Today's focus tasks, generating them on the first request of the day.
///
/// When the model yields nothing usable the static defaults are stored
/// instead.
pub async fn todays_focus_tasks(
    pool: &PgPool,
    llm: &dyn LlmClient,
    user_id: DbId,
) -> Result<Vec<FocusTask>, PipelineError> {
    let existing = FocusTaskRepo::list_today(pool, user_id).await?;
    if !existing.is_empty() {
        return Ok(existing);
    }

    let digest = story_digest(pool, user_id).await?;
    let req = CompletionRequest::new(prompts::focus_tasks(&digest)).json();
    let generated = complete_json(llm, "focus_tasks", &req)
        .await
        .map(|value| clean_tasks(task_lines(&value)))
        .unwrap_or_default();
    let tasks = if generated.is_empty() {
        tracing::info!(user_id, "Using default focus tasks");
        default_tasks()
    } else {
        generated
    };
    Ok(FocusTaskRepo::create_many(pool, user_id, &tasks).await?)
}
