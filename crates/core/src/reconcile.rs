//! Removal planning for a project image update.
//!
//! Given the previous slot contents and the client's retain list, decide
//! which references leave each slot and which of those may be physically
//! deleted. A reference removed from one slot is only deletable when no
//! *other* slot listed it previously. Executing the plan (deleting files,
//! committing uploads) is the store's job.

use crate::image::{ImageRef, ImageSlot, ProjectImages};

/// A reference dropped from one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub slot: ImageSlot,
    pub image: ImageRef,
    /// First other slot whose previous list also holds `image`.
    pub shared_with: Option<ImageSlot>,
}

impl Removal {
    /// Whether the backing file may be deleted.
    pub fn is_deletable(&self) -> bool {
        self.shared_with.is_none()
    }
}

/// Removals for every slot, in slot order then previous-list order.
///
/// `retained` is trusted as given; references in it that were never in
/// `previous` are simply carried forward by the caller.
pub fn plan_removals(previous: &ProjectImages, retained: &ProjectImages) -> Vec<Removal> {
    let mut removals = Vec::new();
    for slot in ImageSlot::ALL {
        let keep = retained.get(slot);
        for image in previous.get(slot).iter().filter(|image| !keep.contains(image)) {
            let shared_with = ImageSlot::ALL
                .into_iter()
                .filter(|other| *other != slot)
                .find(|other| previous.get(*other).contains(image));
            removals.push(Removal {
                slot,
                image: image.clone(),
                shared_with,
            });
        }
    }
    removals
}
