//! Path-segment rules for project identifiers and uploaded filenames.
//!
//! Both values end up as components of an on-disk path
//! (`images/projects/<project_id>/<filename>`), so each must be exactly one
//! normal path segment.

use crate::error::CoreError;

/// Check that a project identifier can be used as a directory name.
pub fn validate_project_id(project_id: &str) -> Result<(), CoreError> {
    if project_id.trim().is_empty() {
        return Err(CoreError::Validation("project_id is required".into()));
    }
    if !is_single_segment(project_id) {
        return Err(CoreError::Validation(format!(
            "project_id '{project_id}' must not contain path separators or dot segments"
        )));
    }
    Ok(())
}

/// Reduce a client-supplied filename to its final path component.
///
/// Browsers occasionally send full paths (`C:\fakepath\a.png`); only the
/// last component is kept. Empty names and dot segments are rejected.
pub fn sanitize_filename(original: &str) -> Result<String, CoreError> {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();

    if base.is_empty() || !is_single_segment(base) {
        return Err(CoreError::Validation(format!(
            "Invalid upload filename '{original}'"
        )));
    }
    Ok(base.to_string())
}

/// Build the unique staging name for an upload.
///
/// Convention: `{millis}-{suffix}-{original}`. The main image keeps this
/// name once committed, slot images are renamed back to `original`.
///
/// ```
/// use folio_core::naming::staged_filename;
///
/// assert_eq!(staged_filename(1700000000000, 42, "a.png"), "1700000000000-42-a.png");
/// ```
pub fn staged_filename(millis: i64, suffix: u32, original: &str) -> String {
    format!("{millis}-{suffix}-{original}")
}

fn is_single_segment(value: &str) -> bool {
    value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0'])
        && !value.chars().any(char::is_control)
}
