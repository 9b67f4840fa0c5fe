//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;
use storybible_core::types::DbId;
use storybible_db::models::book::CreateBook;
use storybible_db::models::character::CreateCharacter;
use storybible_db::models::event::CreateEvent;
use storybible_db::models::user::CreateUser;
use storybible_db::repositories::{BookRepo, CharacterRepo, EventRepo, UserRepo};
use storybible_llm::mock::ScriptedLlm;
use storybible_pipeline::PipelineContext;
use tokio_util::sync::CancellationToken;

pub async fn new_user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "$argon2id$placeholder".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn new_book(pool: &PgPool, user_id: DbId, title: &str) -> DbId {
    BookRepo::create(
        pool,
        user_id,
        &CreateBook {
            title: title.to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn new_character(pool: &PgPool, user_id: DbId, name: &str) -> DbId {
    CharacterRepo::create(
        pool,
        user_id,
        &CreateCharacter {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

/// A scene in `book_id` featuring `characters`.
pub async fn add_scene(pool: &PgPool, user_id: DbId, book_id: DbId, title: &str, characters: &[DbId]) -> DbId {
    EventRepo::create(
        pool,
        user_id,
        &CreateEvent {
            title: title.to_string(),
            book_id,
            description: Some(format!("{title} happens.")),
            character_ids: Some(characters.to_vec()),
            ..Default::default()
        },
        0,
    )
    .await
    .unwrap()
    .id
}

/// A context over `llm` with a live cancellation token.
pub fn context(pool: &PgPool, llm: Arc<ScriptedLlm>) -> PipelineContext {
    PipelineContext::new(pool.clone(), llm, CancellationToken::new())
}
