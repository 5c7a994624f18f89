pub mod auth;
pub mod category;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree.
///
/// Route hierarchy:
///
/// ```text
/// /login                        login (public)
///
/// /projects                     list (public), create (requires auth)
/// /projects/{project_id}        get (public), update, delete (requires auth)
///
/// /categories                   list (public)
/// ```
///
/// Write endpoints authenticate through the [`AuthUser`] extractor.
///
/// [`AuthUser`]: crate::middleware::auth::AuthUser
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/projects", project::router())
        .merge(category::router())
}
