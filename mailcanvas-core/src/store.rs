//! Saved template records.
//!
//! [`TemplateStore`] is a thread-safe collection of [`TemplateRecord`]s that
//! can be shared between HTTP handlers. When a data directory is configured
//! every record is mirrored to `<data_dir>/<id>.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::structured::StructuredTemplate;
use crate::Template;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record has the requested id.
    #[error("Template not found: {0}")]
    NotFound(String),
    /// Another record already uses the shortcode.
    #[error("Shortcode already in use: {0}")]
    DuplicateShortcode(String),
    /// A required field is missing or blank.
    #[error("Validation error: {0}")]
    Validation(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// The editable source a record was saved from.
///
/// Canvas documents carry `elements`; structured ones carry `name`, `brand`
/// and the section blocks, so the two shapes never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateBody {
    /// Free-form element canvas.
    Canvas(Template),
    /// Fixed-shape structured email.
    Structured(StructuredTemplate),
}

/// A persisted template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Retrieval key for `/get-template`.
    #[serde(default)]
    pub api_shortcode: Option<String>,
    /// Generated HTML, served verbatim.
    #[serde(default)]
    pub html: String,
    /// Source document, when the record came from an editor.
    #[serde(default)]
    pub json_template: Option<TemplateBody>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by a caller when saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    /// Display name.
    pub name: String,
    /// Retrieval key; blank is treated as absent.
    #[serde(default)]
    pub api_shortcode: Option<String>,
    /// Generated HTML.
    pub html: String,
    /// Source document.
    #[serde(default)]
    pub json_template: Option<TemplateBody>,
}

impl TemplateDraft {
    /// Create a draft with a name and HTML body.
    #[must_use]
    pub fn new(name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_shortcode: None,
            html: html.into(),
            json_template: None,
        }
    }

    /// Set the retrieval shortcode.
    #[must_use]
    pub fn with_shortcode(mut self, shortcode: impl Into<String>) -> Self {
        self.api_shortcode = Some(shortcode.into());
        self
    }

    /// Attach the source document.
    #[must_use]
    pub fn with_body(mut self, body: TemplateBody) -> Self {
        self.json_template = Some(body);
        self
    }

    /// Trim fields and reject a blank name or blank HTML.
    fn normalized(self) -> Result<Self, StoreError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Validation("template name is required".into()));
        }
        if self.html.trim().is_empty() {
            return Err(StoreError::Validation("template HTML is required".into()));
        }
        let api_shortcode = self
            .api_shortcode
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Self {
            name,
            api_shortcode,
            html: self.html,
            json_template: self.json_template,
        })
    }
}

/// Suggested shortcode for a save-as copy.
#[must_use]
pub fn copy_shortcode(current: &str) -> String {
    format!("{}-copy", current.trim())
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, TemplateRecord>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// A timestamp strictly later than any handed out before.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn shortcode_taken(&self, shortcode: Option<&str>, except: Option<&str>) -> bool {
        let Some(shortcode) = shortcode else {
            return false;
        };
        self.records.values().any(|record| {
            Some(record.id.as_str()) != except && record.api_shortcode.as_deref() == Some(shortcode)
        })
    }
}

/// Thread-safe template storage.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    inner: Arc<RwLock<Inner>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl TemplateStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store backed by `data_dir`, loading any records already there.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or read.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let store = Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            data_dir: Some(data_dir),
        };
        let loaded = store.load_all_from_disk()?;
        tracing::info!("Loaded {loaded} templates from disk");
        Ok(store)
    }

    /// All records, most recently updated first.
    #[must_use]
    pub fn list(&self) -> Vec<TemplateRecord> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records
    }

    /// Records whose name contains `query`, ignoring case.
    ///
    /// A blank query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<TemplateRecord> {
        let needle = query.trim().to_lowercase();
        let mut records = self.list();
        if !needle.is_empty() {
            records.retain(|record| record.name.to_lowercase().contains(&needle));
        }
        records
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<TemplateRecord> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.records.get(id).cloned()
    }

    /// Look up a record by its retrieval shortcode.
    #[must_use]
    pub fn find_by_shortcode(&self, shortcode: &str) -> Option<TemplateRecord> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .records
            .values()
            .find(|record| record.api_shortcode.as_deref() == Some(shortcode))
            .cloned()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save `draft` as a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank name or HTML, and
    /// [`StoreError::DuplicateShortcode`] if the shortcode is already used.
    pub fn insert(&self, draft: TemplateDraft) -> Result<TemplateRecord, StoreError> {
        let draft = draft.normalized()?;
        let record = {
            let mut inner = self
                .inner
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if inner.shortcode_taken(draft.api_shortcode.as_deref(), None) {
                return Err(StoreError::DuplicateShortcode(
                    draft.api_shortcode.unwrap_or_default(),
                ));
            }
            let stamp = inner.next_stamp();
            let record = TemplateRecord {
                id: Uuid::new_v4().to_string(),
                name: draft.name,
                api_shortcode: draft.api_shortcode,
                html: draft.html,
                json_template: draft.json_template,
                created_at: stamp,
                updated_at: stamp,
            };
            inner.records.insert(record.id.clone(), record.clone());
            record
        };
        tracing::debug!(id = %record.id, name = %record.name, "Inserted template");
        self.persist_record(&record);
        Ok(record)
    }

    /// Replace the contents of record `id`, keeping its creation time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id, plus the
    /// validation errors of [`TemplateStore::insert`].
    pub fn update(&self, id: &str, draft: TemplateDraft) -> Result<TemplateRecord, StoreError> {
        let draft = draft.normalized()?;
        let record = {
            let mut inner = self
                .inner
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if !inner.records.contains_key(id) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            if inner.shortcode_taken(draft.api_shortcode.as_deref(), Some(id)) {
                return Err(StoreError::DuplicateShortcode(
                    draft.api_shortcode.unwrap_or_default(),
                ));
            }
            let stamp = inner.next_stamp();
            let Some(record) = inner.records.get_mut(id) else {
                return Err(StoreError::NotFound(id.to_string()));
            };
            record.name = draft.name;
            record.api_shortcode = draft.api_shortcode;
            record.html = draft.html;
            record.json_template = draft.json_template;
            record.updated_at = stamp;
            record.clone()
        };
        tracing::debug!(id = %record.id, "Updated template");
        self.persist_record(&record);
        Ok(record)
    }

    /// Remove record `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub fn delete(&self, id: &str) -> Result<TemplateRecord, StoreError> {
        let removed = {
            let mut inner = self
                .inner
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            inner
                .records
                .remove(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?
        };
        tracing::debug!(id, "Deleted template");
        self.delete_record_file(id);
        Ok(removed)
    }

    /// Read every `*.json` record in the data directory into memory.
    ///
    /// Unreadable files are skipped with a warning. Returns how many records
    /// were loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory is configured or it can't be read.
    pub fn load_all_from_disk(&self) -> Result<usize, StoreError> {
        let data_dir = self
            .data_dir
            .as_ref()
            .ok_or_else(|| StoreError::Validation("No data directory configured".into()))?;
        let mut loaded = Vec::new();
        for entry in std::fs::read_dir(data_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|contents| {
                    serde_json::from_str::<TemplateRecord>(&contents)
                        .map_err(|e| StoreError::Serialization(e.to_string()))
                });
            match parsed {
                Ok(record) => loaded.push(record),
                Err(e) => tracing::warn!("Skipping template file {}: {e}", path.display()),
            }
        }

        let count = loaded.len();
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for record in loaded {
            let newer = match inner.last_stamp {
                Some(last) => record.updated_at > last,
                None => true,
            };
            if newer {
                inner.last_stamp = Some(record.updated_at);
            }
            inner.records.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    /// Directory records are mirrored to, if any.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn record_path(&self, id: &str) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", sanitize_filename(id))))
    }

    fn persist_record(&self, record: &TemplateRecord) {
        let Some(path) = self.record_path(&record.id) else {
            return;
        };
        let json = match serde_json::to_string_pretty(record) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize template {}: {e}", record.id);
                return;
            }
        };
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!(
                "Failed to persist template {} to {}: {e}",
                record.id,
                path.display()
            );
        }
    }

    fn delete_record_file(&self, id: &str) {
        let Some(path) = self.record_path(id) else {
            return;
        };
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete template file {}: {e}", path.display());
            }
        }
    }
}

/// Sanitize an id for use as a filename.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
