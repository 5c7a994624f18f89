//! Applies an image update to the asset store.
//!
//! Order matters: every planned deletion across all slots runs before any
//! upload is committed, so a new upload may take over a name that was just
//! freed instead of being deduplicated onto the file being removed.

use folio_core::image::{ImageRef, ImageSlot, ProjectImages, SlotMap, UploadedFile};
use folio_core::reconcile::plan_removals;

use crate::assets::AssetStore;
use crate::error::StoreError;

pub struct ImageReconciler<'a> {
    assets: &'a AssetStore,
}

impl<'a> ImageReconciler<'a> {
    pub fn new(assets: &'a AssetStore) -> Self {
        Self { assets }
    }

    /// Converge the four slots to `retained ++ uploads`.
    ///
    /// References dropped from a slot are deleted from disk unless another
    /// slot's previous list still holds them.
    pub async fn reconcile_slots(
        &self,
        project_id: &str,
        previous: &ProjectImages,
        retained: ProjectImages,
        uploads: &SlotMap<Vec<UploadedFile>>,
    ) -> Result<ProjectImages, StoreError> {
        for removal in plan_removals(previous, &retained) {
            match removal.shared_with {
                Some(other) => tracing::debug!(
                    project_id,
                    image = %removal.image,
                    slot = %removal.slot,
                    still_in = %other,
                    "Dropped image still referenced by another slot, keeping file"
                ),
                None => {
                    self.assets.delete_file(&removal.image).await?;
                }
            }
        }

        let mut images = retained;
        self.commit_slot_uploads(project_id, &mut images, uploads)
            .await?;
        Ok(images)
    }

    /// Append committed uploads to each slot, in field order.
    pub async fn commit_slot_uploads(
        &self,
        project_id: &str,
        images: &mut ProjectImages,
        uploads: &SlotMap<Vec<UploadedFile>>,
    ) -> Result<(), StoreError> {
        for slot in ImageSlot::ALL {
            for file in uploads.get(slot) {
                let image = self.assets.commit_upload(project_id, file).await?;
                images.get_mut(slot).push(image);
            }
        }
        Ok(())
    }

    /// Swap the main image when a new one was uploaded.
    ///
    /// The previous file is deleted without a cross-slot check; main images
    /// carry unique generated names and are never shared. Without an upload
    /// the previous reference is returned untouched.
    pub async fn replace_main_image(
        &self,
        project_id: &str,
        previous: Option<&ImageRef>,
        upload: Option<&UploadedFile>,
    ) -> Result<Option<ImageRef>, StoreError> {
        let Some(file) = upload else {
            return Ok(previous.cloned());
        };

        if let Some(old) = previous {
            self.assets.delete_file(old).await?;
        }
        let image = self.assets.commit_generated(project_id, file).await?;
        Ok(Some(image))
    }
}
