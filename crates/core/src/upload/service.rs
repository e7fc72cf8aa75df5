//! Upload and delete orchestration.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::association::Cardinality;
use super::error::UploadError;
use super::registry::UploadConfiguration;
use super::settings::UploadTrigger;
use super::source::{TempFileSource, UploadSource};
use super::store::FileRecordStore;
use super::types::{DeleteReport, FileRecord, FileRecordDraft, OwnerEntity, UploadOutcome};
use crate::storage::{AdapterRegistry, StorageError};

/// Moves uploaded bytes into storage adapters and keeps the file record
/// store in step.
///
/// There is no compensation between a successful write and record creation:
/// if the record cannot be created the stored object is orphaned.
pub struct UploadService<S: FileRecordStore> {
    adapters: Arc<AdapterRegistry>,
    store: Arc<S>,
    source: Arc<dyn UploadSource>,
}

impl<S: FileRecordStore> UploadService<S> {
    /// Create a new upload service reading uploads from temporary files.
    #[must_use]
    pub fn new(adapters: Arc<AdapterRegistry>, store: Arc<S>) -> Self {
        Self {
            adapters,
            store,
            source: Arc::new(TempFileSource),
        }
    }

    /// Replace the upload source.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn UploadSource>) -> Self {
        self.source = source;
        self
    }

    /// The file record store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the owner's upload to its adapter and record it.
    ///
    /// With a `pre_save` trigger and no owner identifier yet, the record is
    /// parked on `owner.pending_upload` for [`Self::commit_pending`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payload is malformed or incomplete
    /// - The owner has no identifier outside a `pre_save` upload
    /// - The configured adapter is not registered
    /// - The temporary file cannot be read
    /// - The adapter write fails (no record is created)
    /// - The record cannot be created
    pub async fn perform_upload(
        &self,
        config: &UploadConfiguration,
        owner: &mut OwnerEntity,
    ) -> Result<UploadOutcome, UploadError> {
        let Some(payload) = owner.upload_payload(&config.association.name, &config.file_field)?
        else {
            debug!(model = %config.model, field = %config.file_field, "no upload payload");
            return Ok(UploadOutcome::NoFile);
        };
        if !payload.is_complete() {
            return Err(UploadError::IncompleteUpload {
                code: payload.error_code,
            });
        }
        // Only a pre_save upload may run before the owner has an identifier.
        if owner.id.is_none() && config.upload_trigger != UploadTrigger::PreSave {
            return Err(UploadError::missing_owner_id(&owner.model));
        }

        let adapter = self
            .adapters
            .get(&config.adapter_name)
            .map_err(|_| UploadError::UnknownAdapter(config.adapter_name.clone()))?;
        let key = config.compute_key(owner);
        let content = self.source.read(&payload).await?;

        adapter
            .write(&key, content)
            .await
            .map_err(|source| UploadError::AdapterWrite {
                key: key.clone(),
                source,
            })?;

        let draft = FileRecordDraft {
            model: config.model.clone(),
            path: key,
            adapter: config.adapter_name.clone(),
            filename: payload.name,
            mime_type: payload.mime_type,
            filesize: payload.size,
        };
        let fields = mirrored_fields(config, &draft, owner.id.as_deref());
        owner.mirror_upload(&config.association.name, fields);

        match owner.id.clone() {
            Some(foreign_key) => {
                let record = self.create_record(draft, &foreign_key).await?;
                Ok(UploadOutcome::Stored(record))
            }
            None => {
                debug!(
                    model = %config.model,
                    key = %draft.path,
                    "file stored; record deferred until owner is saved"
                );
                owner.pending_upload = Some(draft);
                Ok(UploadOutcome::Deferred)
            }
        }
    }

    /// Create the record for a file written before the owner had an
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::MissingOwnerId`] if the owner still has no
    /// identifier (the draft stays parked), or a store error.
    pub async fn commit_pending(
        &self,
        config: &UploadConfiguration,
        owner: &mut OwnerEntity,
    ) -> Result<Option<FileRecord>, UploadError> {
        let Some(foreign_key) = owner.id.clone() else {
            return if owner.pending_upload.is_some() {
                Err(UploadError::missing_owner_id(&owner.model))
            } else {
                Ok(None)
            };
        };
        let Some(draft) = owner.pending_upload.take() else {
            return Ok(None);
        };

        let mut fields = Map::new();
        fields.insert("foreign_key".to_string(), Value::String(foreign_key.clone()));
        owner.mirror_upload(&config.association.name, fields);

        self.create_record(draft, &foreign_key).await.map(Some)
    }

    /// Delete every stored file the owner holds through its association.
    ///
    /// All matched records are attempted even after a failure. Records whose
    /// stored file was deleted are removed from the store; the others remain.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::MissingOwnerId`] without an owner identifier,
    /// a store error if the lookup fails, and
    /// [`UploadError::AdapterDelete`] if any per-record delete failed.
    pub async fn perform_delete(
        &self,
        config: &UploadConfiguration,
        owner: &OwnerEntity,
    ) -> Result<DeleteReport, UploadError> {
        let foreign_key = owner
            .id
            .as_deref()
            .ok_or_else(|| UploadError::missing_owner_id(&owner.model))?;

        let mut records = self
            .store
            .find(&config.association, &config.model, foreign_key)
            .await?;
        if config.association.cardinality == Cardinality::HasOne {
            records.truncate(1);
        }

        let mut report = DeleteReport {
            matched: records.len(),
            removed: 0,
        };
        let mut failed = 0;

        for record in &records {
            if let Err(err) = self.delete_stored_file(record).await {
                warn!(
                    model = %config.model,
                    foreign_key,
                    key = %record.path,
                    adapter = %record.adapter,
                    error = %err,
                    "failed to delete stored file"
                );
                failed += 1;
                continue;
            }

            match self.store.delete(record.id).await {
                Ok(_) => report.removed += 1,
                Err(err) => {
                    warn!(record_id = %record.id, error = %err, "failed to delete file record");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(UploadError::AdapterDelete {
                failed,
                attempted: report.matched,
            });
        }

        if report.matched > 0 {
            info!(
                model = %config.model,
                foreign_key,
                removed = report.removed,
                "stored files deleted"
            );
        }
        Ok(report)
    }

    async fn delete_stored_file(&self, record: &FileRecord) -> Result<(), StorageError> {
        let adapter = self.adapters.get(&record.adapter)?;
        adapter.delete(&record.path).await
    }

    async fn create_record(
        &self,
        draft: FileRecordDraft,
        foreign_key: &str,
    ) -> Result<FileRecord, UploadError> {
        let key = draft.path.clone();
        let record = self
            .store
            .create(draft.attach(foreign_key))
            .await
            .inspect_err(|err| {
                warn!(key = %key, error = %err, "stored file has no file record");
            })?;
        info!(
            model = %record.model,
            foreign_key = %record.foreign_key,
            key = %record.path,
            adapter = %record.adapter,
            "file stored"
        );
        Ok(record)
    }
}

fn mirrored_fields(
    config: &UploadConfiguration,
    draft: &FileRecordDraft,
    foreign_key: Option<&str>,
) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("model".to_string(), Value::String(draft.model.clone()));
    fields.insert("adapter".to_string(), Value::String(draft.adapter.clone()));
    fields.insert(config.path_field.clone(), Value::String(draft.path.clone()));
    if let Some(foreign_key) = foreign_key {
        fields.insert("foreign_key".to_string(), Value::String(foreign_key.to_string()));
    }
    fields
}
