//! Upload types and data structures.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use filestore_shared::types::FileRecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::UploadError;

/// The owning entity as seen by the lifecycle hooks.
///
/// `data` is the entity's pending save data. `pending_upload` carries a file
/// written in `pre_save` until the owner has an identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerEntity {
    /// Owning model (entity type) name.
    pub model: String,
    /// Persisted identifier, once the owner has been saved.
    pub id: Option<String>,
    /// Pending save data.
    pub data: Map<String, Value>,
    /// File written before the owner had an identifier.
    pub pending_upload: Option<FileRecordDraft>,
}

impl OwnerEntity {
    /// Create an unsaved owner with no data.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the persisted identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Replace the pending save data. Non-object values are ignored.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    /// Locate and parse the upload payload.
    ///
    /// Looks under `data[association][file_field]` first, then
    /// `data[file_field]`. A missing or `null` field means no upload.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidPayload`] if the field is present but is
    /// not an upload descriptor.
    pub fn upload_payload(
        &self,
        association: &str,
        file_field: &str,
    ) -> Result<Option<UploadPayload>, UploadError> {
        let nested = self
            .data
            .get(association)
            .and_then(Value::as_object)
            .and_then(|assoc| assoc.get(file_field));
        let raw = match nested.or_else(|| self.data.get(file_field)) {
            None | Some(Value::Null) => return Ok(None),
            Some(raw) => raw,
        };

        serde_json::from_value(raw.clone())
            .map(Some)
            .map_err(|e| UploadError::InvalidPayload(format!("{file_field}: {e}")))
    }

    /// Mirror file-record fields into `data[association]` so the host sees
    /// where the upload went.
    pub(crate) fn mirror_upload(&mut self, association: &str, fields: Map<String, Value>) {
        let slot = self
            .data
            .entry(association.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(assoc) = slot {
            assoc.extend(fields);
        }
    }
}

/// Raw upload descriptor found on the owner's pending data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    /// Client-side file name.
    #[serde(default)]
    pub name: Option<String>,
    /// Client-declared MIME type.
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    /// Temporary location of the uploaded bytes.
    pub tmp_name: PathBuf,
    /// Upload error code; zero means the upload completed.
    #[serde(rename = "error", default)]
    pub error_code: i64,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl UploadPayload {
    /// Whether the upload completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error_code == 0
    }
}

/// A stored file whose owner does not have an identifier yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecordDraft {
    /// Owning model name.
    pub model: String,
    /// Storage key.
    pub path: String,
    /// Adapter the bytes were written to.
    pub adapter: String,
    /// Client-side file name.
    pub filename: Option<String>,
    /// Client-declared MIME type.
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub filesize: u64,
}

impl FileRecordDraft {
    /// Attach the owner's identifier, producing a record ready to create.
    #[must_use]
    pub fn attach(self, foreign_key: impl Into<String>) -> NewFileRecord {
        NewFileRecord {
            id: FileRecordId::new(),
            model: self.model,
            foreign_key: foreign_key.into(),
            path: self.path,
            adapter: self.adapter,
            filename: self.filename,
            mime_type: self.mime_type,
            filesize: self.filesize,
        }
    }
}

/// Input for creating a file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    /// Record ID.
    pub id: FileRecordId,
    /// Owning model name.
    pub model: String,
    /// Owner identifier.
    pub foreign_key: String,
    /// Storage key.
    pub path: String,
    /// Adapter name.
    pub adapter: String,
    /// Client-side file name.
    pub filename: Option<String>,
    /// Client-declared MIME type.
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub filesize: u64,
}

/// File-metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Unique identifier.
    pub id: FileRecordId,
    /// Owning model name.
    pub model: String,
    /// Owner identifier.
    pub foreign_key: String,
    /// Storage key.
    pub path: String,
    /// Adapter name.
    pub adapter: String,
    /// Client-side file name.
    pub filename: Option<String>,
    /// Client-declared MIME type.
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub filesize: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Result of an upload phase.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The owner carried no upload payload.
    NoFile,
    /// Bytes written and record created.
    Stored(FileRecord),
    /// Bytes written; the record waits for the owner's identifier.
    Deferred,
}

/// Result of a successful delete phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteReport {
    /// File records matched for the owner.
    pub matched: usize,
    /// Stored files removed along with their records.
    pub removed: usize,
}

/// What a lifecycle hook did.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// The phase is not configured for this model.
    Skipped,
    /// The upload phase ran.
    Upload(UploadOutcome),
    /// The delete phase ran.
    Delete(DeleteReport),
}
