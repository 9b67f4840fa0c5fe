pub mod account;
pub mod ai;
pub mod auth;
pub mod books;
pub mod chapters;
pub mod characters;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod relationships;
pub mod tags;
pub mod world;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route except `/auth/register`, `/auth/login` and `/auth/refresh`
/// requires a bearer token; rows are always scoped to its user.
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh       public
/// /auth/logout                                     end one or all sessions
/// /account                                         get, update
///
/// /dashboard                                       overview
/// /activity                                        activity log
///
/// /books                                           list, create
/// /books/import                                    create from manuscript
/// /books/{id}                                      get, update, delete
/// /books/{id}/import                               import into book
/// /books/{id}/import-status                        job progress
/// /books/{id}/deep-scan                            start deep scan
/// /books/{id}/export                               markdown story bible
/// /books/{id}/cover                                cover image upload
/// /books/{id}/chapters                             list, create
/// /books/{id}/chapters/next-number                 next chapter number
///
/// /chapters/{id}                                   get, update, delete
/// /chapters/{id}/assist                            writing assistant
///
/// /characters                                      list, create
/// /characters/{id}                                 get, update, delete
/// /characters/{id}/profile-image                   profile image upload
///
/// /events                                          list (filters), create
/// /events/reorder                                  set sequence position
/// /events/{id}                                     get, update, delete
/// /events/{id}/move                                one step up or down
///
/// /tags                                            list, create
/// /tags/{id}                                       update, delete
///
/// /relationships                                   list, create
/// /relationships/graph                             nodes and edges
/// /relationships/analyze                           AI pair analysis
/// /relationships/sync-from-cache                   apply cached analyses
/// /relationships/{id}                              update, delete
///
/// /world-entries                                   list (filters), create
/// /world-entries/{id}                              get, update, delete
/// /world-entries/{id}/image                        image upload
///
/// /ai/consultant                                   story consultant
/// /ai/focus-tasks                                  today's tasks
/// /ai/focus-tasks/{id}/complete                    mark done
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/account", account::router())
        .merge(dashboard::router())
        .nest("/books", books::router())
        .nest("/chapters", chapters::router())
        .nest("/characters", characters::router())
        .nest("/events", events::router())
        .nest("/tags", tags::router())
        .nest("/relationships", relationships::router())
        .nest("/world-entries", world::router())
        .nest("/ai", ai::router())
}
