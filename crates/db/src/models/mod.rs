//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod activity;
pub mod ai_cache;
pub mod book;
pub mod chapter;
pub mod character;
pub mod dashboard;
pub mod event;
pub mod focus_task;
pub mod relationship;
pub mod session;
pub mod tag;
pub mod user;
pub mod world_entry;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field of an update DTO.
///
/// An absent field stays `None` (keep the stored value) while an explicit
/// `null` becomes `Some(None)` (clear it). Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::event::UpdateEvent;

    #[test]
    fn null_clears_and_absence_keeps() {
        let absent: UpdateEvent = serde_json::from_str(r#"{"title":"Scene"}"#).unwrap();
        assert_eq!(absent.pov_character_id, None);

        let cleared: UpdateEvent = serde_json::from_str(r#"{"pov_character_id":null}"#).unwrap();
        assert_eq!(cleared.pov_character_id, Some(None));

        let set: UpdateEvent = serde_json::from_str(r#"{"chapter_id":7}"#).unwrap();
        assert_eq!(set.chapter_id, Some(Some(7)));
    }
}
