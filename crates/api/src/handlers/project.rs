//! Handlers for the `/projects` resource.
//!
//! Create and update take `multipart/form-data`: text fields for metadata
//! (JSON-encoded for `meta`, `category`, `tags`, `retainedImages`) and file
//! fields `mainImage`, `slider1`, `slider2`, `column1`, `column2`.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::project::{NewProject, ProjectRecord, ProjectUpdate};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{
    DeletedResponse, ProjectResponse, MSG_PROJECT_CREATED, MSG_PROJECT_DELETED,
    MSG_PROJECT_UPDATED,
};
use crate::state::AppState;
use crate::upload::{discard_staged, read_upload_form};

/// GET /projects
///
/// All projects, sorted by title ignoring case.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<ProjectRecord>>> {
    let projects = state.projects.list_projects().await?;
    Ok(Json(projects))
}

/// GET /projects/{project_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<ProjectRecord>> {
    let project = state.projects.get_project(&project_id).await?;
    Ok(Json(project))
}

/// POST /projects
///
/// Requires `project_id`. Re-using an existing id overwrites that project.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let form = read_upload_form(multipart, &state.config.storage.upload_temp_dir).await?;
    let staged = form.files.staged_paths();

    let result = match NewProject::from_form(&form.fields) {
        Ok(input) => state
            .projects
            .create_project(input, form.files)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e.into()),
    };
    if result.is_err() {
        discard_staged(&staged).await;
    }
    let project = result?;

    tracing::info!(project_id = %project.project_id, user = %user.username, "Created project");
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            message: MSG_PROJECT_CREATED,
            project,
        }),
    ))
}

/// PUT /projects/{project_id}
///
/// Omitted metadata fields keep their stored values. Slot images not listed
/// in `retainedImages` are removed; new files are appended after the
/// retained ones.
pub async fn update(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ProjectResponse>> {
    let form = read_upload_form(multipart, &state.config.storage.upload_temp_dir).await?;
    let staged = form.files.staged_paths();

    let result = match ProjectUpdate::from_form(&form.fields) {
        Ok(input) => state
            .projects
            .update_project(&project_id, input, form.files)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e.into()),
    };
    if result.is_err() {
        discard_staged(&staged).await;
    }
    let project = result?;

    tracing::info!(project_id = %project.project_id, user = %user.username, "Updated project");
    Ok(Json(ProjectResponse {
        message: MSG_PROJECT_UPDATED,
        project,
    }))
}

/// DELETE /projects/{project_id}
///
/// Removes the record and the project's whole image directory.
pub async fn delete(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    user: AuthUser,
) -> AppResult<Json<DeletedResponse>> {
    let deleted = state.projects.delete_project(&project_id).await?;

    tracing::info!(project_id = %deleted.project_id, user = %user.username, "Deleted project");
    Ok(Json(DeletedResponse {
        message: MSG_PROJECT_DELETED,
        deleted,
    }))
}
