//! In-memory collaborators for upload tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use filestore_shared::types::FileRecordId;
use serde_json::{Value, json};

use super::association::ResolvedAssociation;
use super::error::UploadError;
use super::store::FileRecordStore;
use super::types::{FileRecord, NewFileRecord};
use crate::storage::{StorageAdapter, StorageError};

/// File record store backed by a vector, in insertion order.
#[derive(Debug, Default)]
pub(crate) struct MemoryFileRecordStore {
    records: Mutex<Vec<FileRecord>>,
}

impl MemoryFileRecordStore {
    pub(crate) fn insert(&self, model: &str, foreign_key: &str, path: &str, adapter: &str) {
        self.records.lock().unwrap().push(FileRecord {
            id: FileRecordId::new(),
            model: model.to_string(),
            foreign_key: foreign_key.to_string(),
            path: path.to_string(),
            adapter: adapter.to_string(),
            filename: None,
            mime_type: None,
            filesize: 0,
            created_at: Utc::now(),
        });
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.path.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileRecordStore for MemoryFileRecordStore {
    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, UploadError> {
        let record = FileRecord {
            id: input.id,
            model: input.model,
            foreign_key: input.foreign_key,
            path: input.path,
            adapter: input.adapter,
            filename: input.filename,
            mime_type: input.mime_type,
            filesize: input.filesize,
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        _association: &ResolvedAssociation,
        model: &str,
        foreign_key: &str,
    ) -> Result<Vec<FileRecord>, UploadError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.model == model && r.foreign_key == foreign_key)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: FileRecordId) -> Result<bool, UploadError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

/// Adapter that accepts everything and remembers the keys it saw.
#[derive(Debug, Default)]
pub(crate) struct RecordingAdapter {
    writes: Mutex<Vec<(String, Bytes)>>,
    deletes: Mutex<Vec<String>>,
}

impl RecordingAdapter {
    pub(crate) fn writes(&self) -> Vec<(String, Bytes)> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageAdapter for RecordingAdapter {
    async fn write(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push((key.to_string(), content));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// Adapter whose backend is always unavailable.
#[derive(Debug, Default)]
pub(crate) struct FailingAdapter;

#[async_trait]
impl StorageAdapter for FailingAdapter {
    async fn write(&self, _key: &str, _content: Bytes) -> Result<(), StorageError> {
        Err(StorageError::operation("backend unavailable"))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::operation("backend unavailable"))
    }
}

/// Write `content` to a temporary upload file and describe it as a payload.
///
/// The directory must outlive the payload.
pub(crate) fn temp_upload(content: &[u8]) -> (tempfile::TempDir, Value) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.png");
    std::fs::write(&path, content).unwrap();
    let payload = json!({
        "name": "upload.png",
        "type": "image/png",
        "tmp_name": path,
        "error": 0,
        "size": content.len(),
    });
    (dir, payload)
}
