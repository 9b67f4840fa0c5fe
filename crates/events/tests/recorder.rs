use std::time::Duration;

use sqlx::PgPool;
use storybible_db::models::user::CreateUser;
use storybible_db::repositories::{ActivityRepo, UserRepo};
use storybible_events::bus::{MODEL_BOOK, MODEL_CHARACTER};
use storybible_events::{ActivityEvent, ActivityRecorder, EventBus};

async fn new_user(pool: &PgPool) -> i64 {
    let input = CreateUser {
        username: "author".to_string(),
        email: "author@example.com".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: "$argon2id$placeholder".to_string(),
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recorder_drains_bus_until_closed(pool: PgPool) {
    let user = new_user(&pool).await;
    let bus = EventBus::default();
    let task = tokio::spawn(ActivityRecorder::run(pool.clone(), bus.subscribe()));

    bus.publish(ActivityEvent::created(user, MODEL_BOOK, "The Ember Road"));
    bus.publish(ActivityEvent::updated(user, MODEL_CHARACTER, "Elara"));
    drop(bus);

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("recorder should stop when the bus closes")
        .unwrap();

    let entries = ActivityRepo::list_recent(&pool, user, 10, 0).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].model_name, "Character");
    assert_eq!(entries[1].object_name, "The Ember Road");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_action_is_rejected(pool: PgPool) {
    let user = new_user(&pool).await;
    let event = ActivityEvent::new(user, "archive", MODEL_BOOK, "Old");
    assert!(ActivityRecorder::record(&pool, &event).await.is_err());
}
