//! File record persistence interface.

use filestore_shared::types::FileRecordId;

use super::association::ResolvedAssociation;
use super::error::UploadError;
use super::types::{FileRecord, NewFileRecord};

/// Repository trait for file-metadata persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait FileRecordStore: Send + Sync {
    /// Create a new file record.
    fn create(
        &self,
        input: NewFileRecord,
    ) -> impl std::future::Future<Output = Result<FileRecord, UploadError>> + Send;

    /// Find the file records held by an owner through `association`,
    /// oldest first.
    ///
    /// Records are matched on `model` and `foreign_key` only. The
    /// `conditions`, `foreign_key` column and `class_name` of an
    /// [`AssociationDescriptor`](super::association::AssociationDescriptor)
    /// are for the host's own association registration and are not applied
    /// here. `association` selects the cardinality.
    fn find(
        &self,
        association: &ResolvedAssociation,
        model: &str,
        foreign_key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<FileRecord>, UploadError>> + Send;

    /// Delete a file record by ID.
    fn delete(
        &self,
        id: FileRecordId,
    ) -> impl std::future::Future<Output = Result<bool, UploadError>> + Send;
}
