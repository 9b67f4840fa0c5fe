//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. User-owned rows are always
//! looked up together with the owning `user_id`.

pub mod activity_repo;
pub mod ai_cache_repo;
pub mod book_repo;
pub mod chapter_repo;
pub mod character_repo;
pub mod dashboard_repo;
pub mod event_repo;
pub mod focus_task_repo;
pub mod relationship_repo;
pub mod session_repo;
pub mod tag_repo;
pub mod user_repo;
pub mod world_entry_repo;

pub use activity_repo::ActivityRepo;
pub use ai_cache_repo::AiCacheRepo;
pub use book_repo::BookRepo;
pub use chapter_repo::ChapterRepo;
pub use character_repo::CharacterRepo;
pub use dashboard_repo::DashboardRepo;
pub use event_repo::{EventRepo, MoveDirection};
pub use focus_task_repo::FocusTaskRepo;
pub use relationship_repo::RelationshipRepo;
pub use session_repo::SessionRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
pub use world_entry_repo::WorldEntryRepo;
