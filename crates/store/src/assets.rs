//! On-disk layout of project images.
//!
//! Layout: `<images_root>/projects/<project_id>/<filename>`, served over
//! HTTP as `/images/projects/<project_id>/<filename>`. Callers validate
//! project identifiers before they reach this module.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_core::image::{ImageRef, UploadedFile};
use tokio::fs;

use crate::error::StoreError;

/// Subdirectory of the images root holding one directory per project.
const PROJECTS_DIR: &str = "projects";

/// Filesystem-backed image storage.
#[derive(Debug, Clone)]
pub struct AssetStore {
    images_root: PathBuf,
}

impl AssetStore {
    pub fn new(images_root: impl Into<PathBuf>) -> Self {
        Self {
            images_root: images_root.into(),
        }
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.images_root.join(PROJECTS_DIR).join(project_id)
    }

    /// On-disk path of a reference, if it resolves under the images root.
    pub fn resolve(&self, image: &ImageRef) -> Option<PathBuf> {
        image
            .relative_path()
            .map(|relative| self.images_root.join(relative))
    }

    /// Create the project's image directory if it does not exist yet.
    pub async fn ensure_project_directory(&self, project_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.project_dir(project_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }

    pub async fn file_exists(&self, project_id: &str, filename: &str) -> Result<bool, StoreError> {
        let path = self.project_dir(project_id).join(filename);
        fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    /// Move a staged upload to `<project>/<original name>`.
    ///
    /// When a file with that name already exists the staged copy is thrown
    /// away and the existing file's reference is returned.
    pub async fn commit_upload(
        &self,
        project_id: &str,
        file: &UploadedFile,
    ) -> Result<ImageRef, StoreError> {
        let dir = self.ensure_project_directory(project_id).await?;
        let name = file.original_name();

        if self.file_exists(project_id, name).await? {
            tracing::debug!(project_id, file = name, "Reusing stored file with same name");
            remove_if_present(file.staged_path()).await?;
        } else {
            move_file(file.staged_path(), &dir.join(name)).await?;
        }

        Ok(ImageRef::for_file(project_id, name))
    }

    /// Move a staged upload into the project under its unique staged name.
    pub async fn commit_generated(
        &self,
        project_id: &str,
        file: &UploadedFile,
    ) -> Result<ImageRef, StoreError> {
        let dir = self.ensure_project_directory(project_id).await?;
        move_file(file.staged_path(), &dir.join(file.staged_name())).await?;
        Ok(ImageRef::for_file(project_id, file.staged_name()))
    }

    /// Delete a referenced file. Returns `false` when there was nothing to delete.
    pub async fn delete_file(&self, image: &ImageRef) -> Result<bool, StoreError> {
        let Some(path) = self.resolve(image) else {
            tracing::warn!(image = %image, "Image reference does not resolve under the images root");
            return Ok(false);
        };

        let removed = remove_if_present(&path).await?;
        if !removed {
            tracing::debug!(image = %image, "Image already absent");
        }
        Ok(removed)
    }

    /// Remove the whole project tree, referenced or not.
    pub async fn delete_project_directory(&self, project_id: &str) -> Result<bool, StoreError> {
        let dir = self.project_dir(project_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&dir, e)),
        }
    }
}

async fn remove_if_present(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Rename, falling back to copy + remove when the staging directory sits on
/// another filesystem.
async fn move_file(from: &Path, to: &Path) -> Result<(), StoreError> {
    let Err(rename_err) = fs::rename(from, to).await else {
        return Ok(());
    };

    if fs::copy(from, to).await.is_err() {
        return Err(StoreError::io(from, rename_err));
    }
    remove_if_present(from).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn stage(dir: &Path, name: &str, body: &[u8]) -> UploadedFile {
        let file = UploadedFile::stage(dir, name, 1, 1).unwrap();
        fs::write(file.staged_path(), body).await.unwrap();
        file
    }

    fn setup() -> (tempfile::TempDir, AssetStore, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path().join("images"));
        let staging = root.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();
        (root, store, staging)
    }

    #[tokio::test]
    async fn ensure_project_directory_is_idempotent() {
        let (_root, store, _) = setup();
        let dir = store.ensure_project_directory("p1").await.unwrap();
        store.ensure_project_directory("p1").await.unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("projects/p1"));
    }

    #[tokio::test]
    async fn commit_upload_moves_file_under_original_name() {
        let (_root, store, staging) = setup();
        let file = stage(&staging, "a.png", b"first").await;

        let image = store.commit_upload("p1", &file).await.unwrap();

        assert_eq!(image.as_str(), "/images/projects/p1/a.png");
        assert!(store.file_exists("p1", "a.png").await.unwrap());
        assert!(!file.staged_path().exists());
    }

    #[tokio::test]
    async fn commit_upload_reuses_existing_name() {
        let (_root, store, staging) = setup();
        let first = stage(&staging, "a.png", b"first").await;
        store.commit_upload("p1", &first).await.unwrap();

        let second = UploadedFile::stage(&staging, "a.png", 2, 2).unwrap();
        fs::write(second.staged_path(), b"second").await.unwrap();
        let image = store.commit_upload("p1", &second).await.unwrap();

        assert_eq!(image, ImageRef::for_file("p1", "a.png"));
        assert!(!second.staged_path().exists(), "duplicate must be discarded");
        let stored = fs::read(store.project_dir("p1").join("a.png")).await.unwrap();
        assert_eq!(stored, b"first");
        let entries = std::fs::read_dir(store.project_dir("p1")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn commit_generated_keeps_staged_name() {
        let (_root, store, staging) = setup();
        let file = stage(&staging, "cover.jpg", b"x").await;

        let image = store.commit_generated("p1", &file).await.unwrap();

        assert_eq!(image.as_str(), "/images/projects/p1/1-1-cover.jpg");
        assert!(store.resolve(&image).unwrap().is_file());
    }

    #[tokio::test]
    async fn delete_file_is_idempotent() {
        let (_root, store, staging) = setup();
        let file = stage(&staging, "a.png", b"x").await;
        let image = store.commit_upload("p1", &file).await.unwrap();

        assert!(store.delete_file(&image).await.unwrap());
        assert!(!store.delete_file(&image).await.unwrap());
    }

    #[tokio::test]
    async fn delete_file_ignores_escaping_reference() {
        let (root, store, _) = setup();
        let outside = root.path().join("portfolio.json");
        std::fs::write(&outside, "{}").unwrap();

        let removed = store
            .delete_file(&ImageRef::from("/images/../portfolio.json"))
            .await
            .unwrap();

        assert!(!removed);
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn delete_project_directory_removes_unreferenced_files() {
        let (_root, store, _) = setup();
        let dir = store.ensure_project_directory("p1").await.unwrap();
        std::fs::write(dir.join("stray.txt"), "x").unwrap();

        assert!(store.delete_project_directory("p1").await.unwrap());
        assert!(!dir.exists());
        assert!(!store.delete_project_directory("p1").await.unwrap());
    }
}
