//! Handler for the `/categories` resource.

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /categories
///
/// Categories are curated directly in the portfolio document.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Value>>> {
    let categories = state.projects.list_categories().await?;
    Ok(Json(categories))
}
