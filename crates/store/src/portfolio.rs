//! Repository for the portfolio JSON document.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_core::project::PortfolioDocument;
use tokio::fs;

use crate::error::StoreError;

/// Loads and saves the single portfolio document.
///
/// There is no in-memory cache: every call reads or rewrites the file.
#[derive(Debug, Clone)]
pub struct PortfolioRepository {
    path: PathBuf,
}

impl PortfolioRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or an empty one when the file does not exist yet.
    pub async fn load(&self) -> Result<PortfolioDocument, StoreError> {
        Ok(self.load_existing().await?.unwrap_or_default())
    }

    /// Load the document. Returns `None` when the file does not exist.
    pub async fn load_existing(&self) -> Result<Option<PortfolioDocument>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Rewrite the whole document, pretty-printed.
    ///
    /// The new content goes to a sibling `.tmp` file first and is renamed over
    /// the target, so readers see either the old or the new document.
    pub async fn save(&self, document: &PortfolioDocument) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("portfolio.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
