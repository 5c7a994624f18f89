//! Multipart upload staging.
//!
//! File fields are streamed to the configured staging directory under a
//! unique name and grouped by field; text fields are collected into a map.
//! Nothing here touches project directories. Committing staged files is the
//! project service's job, and whatever it does not consume is removed with
//! [`discard_staged`].

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use folio_core::image::{StagedUploads, UploadedFile};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};

/// Upper bound for the random part of a staged filename.
const STAGED_SUFFIX_RANGE: u32 = 1_000_000_000;

/// A parsed multipart form whose files sit in the staging directory.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Text fields by name. A repeated field keeps its last value.
    pub fields: HashMap<String, String>,
    pub files: StagedUploads,
}

/// Read every field of `multipart`, staging file fields under `staging_dir`.
///
/// On any failure the files staged so far are removed before returning.
pub async fn read_upload_form(mut multipart: Multipart, staging_dir: &Path) -> AppResult<UploadForm> {
    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create staging dir: {e}")))?;

    let mut form = UploadForm::default();
    if let Err(err) = collect_fields(&mut multipart, staging_dir, &mut form).await {
        discard_staged(&form.files.staged_paths()).await;
        return Err(err);
    }
    Ok(form)
}

async fn collect_fields(
    multipart: &mut Multipart,
    staging_dir: &Path,
    form: &mut UploadForm,
) -> AppResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, text);
            continue;
        };

        let file = UploadedFile::stage(
            staging_dir,
            &original_name,
            chrono::Utc::now().timestamp_millis(),
            rand::random_range(0..STAGED_SUFFIX_RANGE),
        )?;
        let staged_path = file.staged_path().to_path_buf();
        // Registered before writing so a failed write is still cleaned up.
        form.files.push(&name, file)?;
        write_field(field, &staged_path).await?;
    }
    Ok(())
}

async fn write_field(mut field: Field<'_>, path: &Path) -> AppResult<()> {
    let mut out = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to stage upload: {e}")))?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        out.write_all(&chunk)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to stage upload: {e}")))?;
    }
    out.flush()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to stage upload: {e}")))?;
    Ok(())
}

/// Remove staged files that were not committed. Already-moved files are skipped.
pub async fn discard_staged(paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Discarded staged upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to discard staged upload")
            }
        }
    }
}
