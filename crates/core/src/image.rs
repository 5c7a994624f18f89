//! Image references, the fixed slot set, and staged uploads.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::naming;

/// URL prefix under which the images root is served.
pub const IMAGES_URL_PREFIX: &str = "/images/";

/// Multipart field carrying the single main image.
pub const MAIN_IMAGE_FIELD: &str = "mainImage";

/// Maximum number of files accepted per slot field in one request.
pub const MAX_FILES_PER_SLOT: usize = 20;

// ---------------------------------------------------------------------------
// ImageRef
// ---------------------------------------------------------------------------

/// Relative URL path of a stored image, e.g. `/images/projects/p1/a.png`.
///
/// Compared as an opaque string. The only parsing done is
/// [`ImageRef::relative_path`], which maps it onto the images root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Reference for `filename` inside `project_id`'s directory.
    pub fn for_file(project_id: &str, filename: &str) -> Self {
        Self(format!("{IMAGES_URL_PREFIX}projects/{project_id}/{filename}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the referenced file relative to the images root.
    ///
    /// Returns `None` when the reference is not under `/images/` or contains
    /// anything other than normal path components.
    pub fn relative_path(&self) -> Option<PathBuf> {
        let rest = self.0.strip_prefix(IMAGES_URL_PREFIX)?;
        let mut relative = PathBuf::new();
        for component in Path::new(rest).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                _ => return None,
            }
        }
        (!relative.as_os_str().is_empty()).then_some(relative)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// One of the four multi-image groups of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Slider1,
    Slider2,
    Column1,
    Column2,
}

impl ImageSlot {
    /// Every slot, in storage and processing order.
    pub const ALL: [ImageSlot; 4] = [
        ImageSlot::Slider1,
        ImageSlot::Slider2,
        ImageSlot::Column1,
        ImageSlot::Column2,
    ];

    /// Wire name, used both as the JSON key and the multipart field name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slider1 => "slider1",
            Self::Slider2 => "slider2",
            Self::Column1 => "column1",
            Self::Column2 => "column2",
        }
    }

    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.as_str() == name)
    }
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per [`ImageSlot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotMap<T> {
    pub slider1: T,
    pub slider2: T,
    pub column1: T,
    pub column2: T,
}

impl<T> SlotMap<T> {
    pub fn get(&self, slot: ImageSlot) -> &T {
        match slot {
            ImageSlot::Slider1 => &self.slider1,
            ImageSlot::Slider2 => &self.slider2,
            ImageSlot::Column1 => &self.column1,
            ImageSlot::Column2 => &self.column2,
        }
    }

    pub fn get_mut(&mut self, slot: ImageSlot) -> &mut T {
        match slot {
            ImageSlot::Slider1 => &mut self.slider1,
            ImageSlot::Slider2 => &mut self.slider2,
            ImageSlot::Column1 => &mut self.column1,
            ImageSlot::Column2 => &mut self.column2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageSlot, &T)> {
        ImageSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }
}

/// The `images` object of a project record.
pub type ProjectImages = SlotMap<Vec<ImageRef>>;

impl ProjectImages {
    /// Every reference across all slots, slot by slot.
    pub fn references(&self) -> impl Iterator<Item = &ImageRef> {
        self.iter().flat_map(|(_, images)| images.iter())
    }
}

// ---------------------------------------------------------------------------
// Staged uploads
// ---------------------------------------------------------------------------

/// A file written to the staging directory but not yet committed to a
/// project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    original_name: String,
    staged_name: String,
    staged_path: PathBuf,
}

impl UploadedFile {
    /// Describe a new upload to be written under `staging_dir`.
    ///
    /// The client filename is reduced to a single segment; the staged name
    /// follows [`naming::staged_filename`]. Nothing is written to disk here.
    pub fn stage(
        staging_dir: &Path,
        original_name: &str,
        millis: i64,
        suffix: u32,
    ) -> Result<Self, CoreError> {
        let original_name = naming::sanitize_filename(original_name)?;
        let staged_name = naming::staged_filename(millis, suffix, &original_name);
        let staged_path = staging_dir.join(&staged_name);
        Ok(Self {
            original_name,
            staged_name,
            staged_path,
        })
    }

    /// Sanitized client filename; the dedup-by-name key.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Unique name the file was staged under.
    pub fn staged_name(&self) -> &str {
        &self.staged_name
    }

    pub fn staged_path(&self) -> &Path {
        &self.staged_path
    }
}

/// Staged uploads of one request, grouped by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedUploads {
    pub main_image: Option<UploadedFile>,
    pub slots: SlotMap<Vec<UploadedFile>>,
}

impl StagedUploads {
    /// Assign a staged file to its multipart field.
    ///
    /// Rejects unknown file fields, a second main image, and more than
    /// [`MAX_FILES_PER_SLOT`] files in one slot.
    pub fn push(&mut self, field: &str, file: UploadedFile) -> Result<(), CoreError> {
        if field == MAIN_IMAGE_FIELD {
            if self.main_image.is_some() {
                return Err(CoreError::Validation(format!(
                    "Only one file is accepted for '{MAIN_IMAGE_FIELD}'"
                )));
            }
            self.main_image = Some(file);
            return Ok(());
        }

        let slot = ImageSlot::from_field(field)
            .ok_or_else(|| CoreError::Validation(format!("Unexpected file field '{field}'")))?;
        let files = self.slots.get_mut(slot);
        if files.len() >= MAX_FILES_PER_SLOT {
            return Err(CoreError::Validation(format!(
                "At most {MAX_FILES_PER_SLOT} files are accepted for '{slot}'"
            )));
        }
        files.push(file);
        Ok(())
    }

    /// Staging paths of every file, main image first.
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.main_image
            .iter()
            .chain(self.slots.iter().flat_map(|(_, files)| files.iter()))
            .map(|file| file.staged_path().to_path_buf())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn staged(name: &str) -> UploadedFile {
        UploadedFile::stage(Path::new("/tmp/staging"), name, 1, 2).unwrap()
    }

    #[test]
    fn reference_for_file_uses_project_prefix() {
        let image = ImageRef::for_file("p1", "a.png");
        assert_eq!(image.as_str(), "/images/projects/p1/a.png");
        assert_eq!(
            image.relative_path(),
            Some(PathBuf::from("projects/p1/a.png"))
        );
    }

    #[test]
    fn reference_outside_images_root_does_not_resolve() {
        assert_eq!(ImageRef::from("/static/a.png").relative_path(), None);
        assert_eq!(ImageRef::from("/images/../portfolio.json").relative_path(), None);
        assert_eq!(ImageRef::from("/images/").relative_path(), None);
        assert_eq!(ImageRef::from("").relative_path(), None);
    }

    #[test]
    fn slot_field_names_round_trip() {
        for slot in ImageSlot::ALL {
            assert_eq!(ImageSlot::from_field(slot.as_str()), Some(slot));
        }
        assert_eq!(ImageSlot::from_field("mainImage"), None);
    }

    #[test]
    fn project_images_deserialize_with_missing_slots() {
        let images: ProjectImages =
            serde_json::from_str(r#"{"slider1": ["/images/projects/p1/a.png"]}"#).unwrap();
        assert_eq!(images.slider1, vec![ImageRef::from("/images/projects/p1/a.png")]);
        assert!(images.slider2.is_empty());
        assert!(images.column2.is_empty());
    }

    #[test]
    fn stage_sanitizes_and_names_file() {
        let file = UploadedFile::stage(Path::new("/tmp/staging"), "dir/a.png", 10, 7).unwrap();
        assert_eq!(file.original_name(), "a.png");
        assert_eq!(file.staged_name(), "10-7-a.png");
        assert_eq!(file.staged_path(), Path::new("/tmp/staging/10-7-a.png"));
    }

    #[test]
    fn push_routes_fields() {
        let mut uploads = StagedUploads::default();
        uploads.push("mainImage", staged("m.png")).unwrap();
        uploads.push("column2", staged("c.png")).unwrap();

        assert_eq!(uploads.main_image.as_ref().unwrap().original_name(), "m.png");
        assert_eq!(uploads.slots.column2.len(), 1);
        assert_eq!(uploads.staged_paths().len(), 2);
    }

    #[test]
    fn push_rejects_second_main_image() {
        let mut uploads = StagedUploads::default();
        uploads.push("mainImage", staged("a.png")).unwrap();
        assert_matches!(
            uploads.push("mainImage", staged("b.png")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn push_rejects_unknown_field_and_overflow() {
        let mut uploads = StagedUploads::default();
        assert_matches!(
            uploads.push("avatar", staged("a.png")),
            Err(CoreError::Validation(_))
        );

        for i in 0..MAX_FILES_PER_SLOT {
            uploads.push("slider1", staged(&format!("{i}.png"))).unwrap();
        }
        assert_matches!(
            uploads.push("slider1", staged("extra.png")),
            Err(CoreError::Validation(_))
        );
    }
}
