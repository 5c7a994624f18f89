//! Project operations over the asset store and the portfolio document.
//!
//! Every mutation reads the whole document, changes it in memory, and
//! writes it back as its last step. Mutations are serialised by an
//! in-process lock; separate processes sharing the same files still race
//! with last-writer-wins semantics.

use folio_core::error::CoreError;
use folio_core::image::{ProjectImages, StagedUploads};
use folio_core::naming;
use folio_core::project::{NewProject, PortfolioDocument, ProjectRecord, ProjectUpdate};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::assets::AssetStore;
use crate::error::PortfolioError;
use crate::portfolio::PortfolioRepository;
use crate::reconciler::ImageReconciler;

pub struct ProjectService {
    assets: AssetStore,
    repository: PortfolioRepository,
    write_lock: Mutex<()>,
}

impl ProjectService {
    pub fn new(assets: AssetStore, repository: PortfolioRepository) -> Self {
        Self {
            assets,
            repository,
            write_lock: Mutex::new(()),
        }
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn repository(&self) -> &PortfolioRepository {
        &self.repository
    }

    /// Check that the portfolio document can be read and parsed.
    pub async fn health_check(&self) -> Result<(), PortfolioError> {
        self.repository.load().await?;
        Ok(())
    }

    /// All projects, sorted by title ignoring case.
    pub async fn list_projects(&self) -> Result<Vec<ProjectRecord>, PortfolioError> {
        Ok(self.repository.load().await?.sorted_by_title())
    }

    pub async fn get_project(&self, project_id: &str) -> Result<ProjectRecord, PortfolioError> {
        self.repository
            .load()
            .await?
            .find(project_id)
            .cloned()
            .ok_or_else(|| project_not_found(project_id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Value>, PortfolioError> {
        Ok(self.repository.load().await?.categories)
    }

    /// Create a project from its form fields and staged uploads.
    ///
    /// An existing record with the same id is overwritten in place.
    pub async fn create_project(
        &self,
        input: NewProject,
        uploads: StagedUploads,
    ) -> Result<ProjectRecord, PortfolioError> {
        let project_id = input.project_id;
        naming::validate_project_id(&project_id)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.repository.load().await?;

        // Re-creating an id replaces the project wholesale, images included.
        if document.find_index(&project_id).is_some()
            && self.assets.delete_project_directory(&project_id).await?
        {
            tracing::debug!(project_id = %project_id, "Cleared images of the project being re-created");
        }
        self.assets.ensure_project_directory(&project_id).await?;
        let reconciler = ImageReconciler::new(&self.assets);
        let main_image = reconciler
            .replace_main_image(&project_id, None, uploads.main_image.as_ref())
            .await?;
        let mut images = ProjectImages::default();
        reconciler
            .commit_slot_uploads(&project_id, &mut images, &uploads.slots)
            .await?;

        let mut record = ProjectRecord::new(project_id.as_str(), input.fields);
        record.main_image = main_image;
        record.images = images;

        if document.upsert(record.clone()) {
            tracing::warn!(project_id = %project_id, "Create overwrote an existing project");
        }
        self.repository.save(&document).await?;

        tracing::info!(project_id = %project_id, "Project created");
        Ok(record)
    }

    /// Apply a metadata + image update to an existing project.
    pub async fn update_project(
        &self,
        project_id: &str,
        input: ProjectUpdate,
        uploads: StagedUploads,
    ) -> Result<ProjectRecord, PortfolioError> {
        naming::validate_project_id(project_id)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.load_existing(project_id).await?;
        let index = document
            .find_index(project_id)
            .ok_or_else(|| project_not_found(project_id))?;
        let previous = document.projects[index].clone();

        let reconciler = ImageReconciler::new(&self.assets);
        let images = reconciler
            .reconcile_slots(project_id, &previous.images, input.retained, &uploads.slots)
            .await?;
        let main_image = reconciler
            .replace_main_image(
                project_id,
                previous.main_image.as_ref(),
                uploads.main_image.as_ref(),
            )
            .await?;

        let record = &mut document.projects[index];
        input.fields.apply_to(record);
        record.images = images;
        record.main_image = main_image;
        let updated = record.clone();

        self.repository.save(&document).await?;

        tracing::info!(project_id, "Project updated");
        Ok(updated)
    }

    /// Remove a project record and its entire image directory.
    pub async fn delete_project(&self, project_id: &str) -> Result<ProjectRecord, PortfolioError> {
        naming::validate_project_id(project_id)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.load_existing(project_id).await?;
        let deleted = document
            .remove(project_id)
            .ok_or_else(|| project_not_found(project_id))?;

        self.assets.delete_project_directory(project_id).await?;
        self.repository.save(&document).await?;

        tracing::info!(project_id, "Project deleted");
        Ok(deleted)
    }

    /// Load the document for a mutation that needs an existing project.
    async fn load_existing(&self, project_id: &str) -> Result<PortfolioDocument, PortfolioError> {
        self.repository.load_existing().await?.ok_or_else(|| {
            PortfolioError::Core(CoreError::NotFound {
                entity: "Portfolio",
                id: project_id.to_string(),
            })
        })
    }
}

fn project_not_found(project_id: &str) -> PortfolioError {
    PortfolioError::Core(CoreError::NotFound {
        entity: "Project",
        id: project_id.to_string(),
    })
}
