//! Response bodies for project mutations.
//!
//! The admin UI expects a human-readable `message` next to the affected
//! record, so mutations do not use a bare record body.

use folio_core::project::ProjectRecord;
use serde::Serialize;

pub const MSG_PROJECT_CREATED: &str = "Project added successfully";
pub const MSG_PROJECT_UPDATED: &str = "Project updated successfully";
pub const MSG_PROJECT_DELETED: &str = "Project deleted successfully";

/// `{ "message": ..., "project": {...} }` returned by create and update.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub message: &'static str,
    pub project: ProjectRecord,
}

/// `{ "message": ..., "deleted": {...} }` returned by delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub deleted: ProjectRecord,
}
