//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`; handlers publish an
//! [`ActivityEvent`] after every successful write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storybible_core::choices::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
use storybible_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ActivityEvent
// ---------------------------------------------------------------------------

/// Record kinds that appear in the activity feed.
pub const MODEL_BOOK: &str = "Book";
pub const MODEL_CHAPTER: &str = "Chapter";
pub const MODEL_CHARACTER: &str = "Character";
pub const MODEL_EVENT: &str = "Event";
pub const MODEL_TAG: &str = "Tag";
pub const MODEL_RELATIONSHIP: &str = "CharacterRelationship";

/// A change made by a user to one of their records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user_id: DbId,
    /// `create`, `update` or `delete`.
    pub action: String,
    pub model_name: String,
    /// Title or name of the record at the time of the change.
    pub object_name: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(
        user_id: DbId,
        action: &str,
        model_name: &str,
        object_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action: action.to_string(),
            model_name: model_name.to_string(),
            object_name: object_name.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn created(user_id: DbId, model_name: &str, object_name: impl Into<String>) -> Self {
        Self::new(user_id, ACTION_CREATE, model_name, object_name)
    }

    pub fn updated(user_id: DbId, model_name: &str, object_name: impl Into<String>) -> Self {
        Self::new(user_id, ACTION_UPDATE, model_name, object_name)
    }

    pub fn deleted(user_id: DbId, model_name: &str, object_name: impl Into<String>) -> Self {
        Self::new(user_id, ACTION_DELETE, model_name, object_name)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest unread events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<ActivityEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped silently when
    /// nobody is listening.
    pub fn publish(&self, event: ActivityEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ActivityEvent::created(7, MODEL_CHARACTER, "Elara Voss"));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.user_id, 7);
        assert_eq!(received.action, "create");
        assert_eq!(received.model_name, "Character");
        assert_eq!(received.object_name, "Elara Voss");
    }

    #[tokio::test]
    async fn every_subscriber_receives() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ActivityEvent::deleted(1, MODEL_TAG, "Betrayal"));

        assert_eq!(rx1.recv().await.unwrap().action, "delete");
        assert_eq!(rx2.recv().await.unwrap().action, "delete");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(ActivityEvent::updated(1, MODEL_BOOK, "Book One"));
    }
}
