//! Project records, the portfolio document, and form-field parsing.
//!
//! The JSON shape is the one the admin UI reads and writes
//! (`project_id`, camelCase for everything else). Unknown keys on records
//! and on the document survive a load/save cycle through the `extra` maps.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::CoreError;
use crate::image::{ImageRef, ProjectImages};
use crate::naming;

// ---------------------------------------------------------------------------
// Form field names
// ---------------------------------------------------------------------------

pub const FIELD_PROJECT_ID: &str = "project_id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_SUMMARY_TITLE: &str = "summaryTitle";
pub const FIELD_PROJECT_DESCRIPTION: &str = "projectDescription";
pub const FIELD_QUESTION: &str = "question";
pub const FIELD_ANSWER: &str = "answer";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_META: &str = "meta";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_TAGS: &str = "tags";
pub const FIELD_RETAINED_IMAGES: &str = "retainedImages";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single portfolio project as stored in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "summaryTitle", default, skip_serializing_if = "Option::is_none")]
    pub summary_title: Option<String>,
    #[serde(
        rename = "projectDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Opaque client metadata.
    #[serde(default)]
    pub meta: Value,
    /// Opaque client category value.
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Stored as `""` when unset.
    #[serde(rename = "mainImage", default, with = "main_image")]
    pub main_image: Option<ImageRef>,
    #[serde(default)]
    pub images: ProjectImages,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectRecord {
    /// Fresh record with no images. Absent `meta` becomes `{}`, absent
    /// `category` stays `null`, absent `tags` becomes `[]`.
    pub fn new(project_id: impl Into<String>, fields: ProjectFields) -> Self {
        let mut record = Self {
            project_id: project_id.into(),
            title: None,
            summary_title: None,
            project_description: None,
            question: None,
            answer: None,
            summary: None,
            meta: Value::Object(Map::new()),
            category: Value::Null,
            tags: Vec::new(),
            main_image: None,
            images: ProjectImages::default(),
            extra: Map::new(),
        };
        fields.apply_to(&mut record);
        record
    }
}

mod main_image {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::image::ImageRef;

    pub fn serialize<S: Serializer>(value: &Option<ImageRef>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_ref().map_or("", ImageRef::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ImageRef>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()).map(ImageRef::from))
    }
}

/// The whole persisted file: `{ "projects": [...], "categories": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDocument {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub categories: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PortfolioDocument {
    pub fn find_index(&self, project_id: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.project_id == project_id)
    }

    pub fn find(&self, project_id: &str) -> Option<&ProjectRecord> {
        self.find_index(project_id).map(|i| &self.projects[i])
    }

    /// Replace the record with the same id in place, or append it.
    ///
    /// Returns `true` when an existing record was overwritten.
    pub fn upsert(&mut self, record: ProjectRecord) -> bool {
        match self.find_index(&record.project_id) {
            Some(index) => {
                self.projects[index] = record;
                true
            }
            None => {
                self.projects.push(record);
                false
            }
        }
    }

    /// Splice a record out, returning it.
    pub fn remove(&mut self, project_id: &str) -> Option<ProjectRecord> {
        self.find_index(project_id).map(|i| self.projects.remove(i))
    }

    /// Projects ordered by title, ignoring case and accents. Missing titles
    /// sort first.
    pub fn sorted_by_title(&self) -> Vec<ProjectRecord> {
        let mut projects = self.projects.clone();
        projects.sort_by(|a, b| compare_titles(a.title.as_deref(), b.title.as_deref()));
        projects
    }
}

fn compare_titles(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    title_sort_key(a)
        .cmp(&title_sort_key(b))
        .then_with(|| a.cmp(b))
}

/// Lowercased title with diacritics stripped (`"Émile"` -> `"emile"`).
fn title_sort_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Form parsing
// ---------------------------------------------------------------------------

/// Metadata carried by a create or update form.
///
/// `None` means the field was not submitted. On update, absent fields keep
/// the stored value; present fields replace it wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFields {
    pub title: Option<String>,
    pub summary_title: Option<String>,
    pub project_description: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub summary: Option<String>,
    pub meta: Option<Value>,
    pub category: Option<Value>,
    pub tags: Option<Vec<String>>,
}

impl ProjectFields {
    /// Parse text and JSON-encoded fields from a multipart form.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, CoreError> {
        let text = |name: &str| form.get(name).cloned();
        Ok(Self {
            title: text(FIELD_TITLE),
            summary_title: text(FIELD_SUMMARY_TITLE),
            project_description: text(FIELD_PROJECT_DESCRIPTION),
            question: text(FIELD_QUESTION),
            answer: text(FIELD_ANSWER),
            summary: text(FIELD_SUMMARY),
            meta: parse_json_field(form, FIELD_META)?,
            category: parse_json_field(form, FIELD_CATEGORY)?,
            tags: parse_json_field(form, FIELD_TAGS)?,
        })
    }

    /// Overwrite every submitted field on `record`.
    pub fn apply_to(self, record: &mut ProjectRecord) {
        fn replace<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        replace(&mut record.title, self.title.map(Some));
        replace(&mut record.summary_title, self.summary_title.map(Some));
        replace(
            &mut record.project_description,
            self.project_description.map(Some),
        );
        replace(&mut record.question, self.question.map(Some));
        replace(&mut record.answer, self.answer.map(Some));
        replace(&mut record.summary, self.summary.map(Some));
        replace(&mut record.meta, self.meta);
        replace(&mut record.category, self.category);
        replace(&mut record.tags, self.tags);
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub project_id: String,
    pub fields: ProjectFields,
}

impl NewProject {
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, CoreError> {
        let project_id = form.get(FIELD_PROJECT_ID).cloned().unwrap_or_default();
        naming::validate_project_id(&project_id)?;
        Ok(Self {
            project_id,
            fields: ProjectFields::from_form(form)?,
        })
    }
}

/// Input for updating a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub fields: ProjectFields,
    /// Client-declared survivors per slot. Empty when `retainedImages` was
    /// omitted, which removes every previous slot image.
    pub retained: ProjectImages,
}

impl ProjectUpdate {
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, CoreError> {
        Ok(Self {
            fields: ProjectFields::from_form(form)?,
            retained: parse_json_field(form, FIELD_RETAINED_IMAGES)?.unwrap_or_default(),
        })
    }
}

/// Parse a JSON-encoded form field.
///
/// A missing or empty field is `Ok(None)`; malformed JSON is a validation
/// error naming the field.
pub fn parse_json_field<T: DeserializeOwned>(
    form: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, CoreError> {
    match form.get(name).map(|raw| raw.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| CoreError::Validation(format!("Field '{name}' is not valid JSON: {e}"))),
    }
}
