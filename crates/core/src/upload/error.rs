//! Upload lifecycle error types.

use std::path::PathBuf;

use filestore_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Upload lifecycle errors.
///
/// `InvalidConfiguration` and `AssociationResolution` are raised while the
/// registry is built and abort setup. Everything else is returned from a
/// lifecycle hook; the host decides whether it aborts the save or delete.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Settings were malformed.
    #[error("invalid upload configuration for {model}: {reason}")]
    InvalidConfiguration {
        /// Owning model name.
        model: String,
        /// What was wrong.
        reason: String,
    },

    /// No association name could be resolved for the owning model.
    #[error("cannot resolve file association for {model}: {reason}")]
    AssociationResolution {
        /// Owning model name.
        model: String,
        /// What was wrong.
        reason: String,
    },

    /// The configured or recorded adapter is not registered.
    #[error("unknown storage adapter: {0}")]
    UnknownAdapter(String),

    /// The upload payload on the owning entity has the wrong shape.
    #[error("invalid upload payload: {0}")]
    InvalidPayload(String),

    /// The upload itself did not complete (non-zero error code).
    #[error("upload incomplete: error code {code}")]
    IncompleteUpload {
        /// Error code carried by the payload.
        code: i64,
    },

    /// The temporary upload file could not be read.
    #[error("cannot read upload from {}: {source}", path.display())]
    ReadPayload {
        /// Temporary location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The storage adapter refused the write.
    #[error("storage write failed for key {key}: {source}")]
    AdapterWrite {
        /// Storage key that was being written.
        key: String,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// One or more per-record deletes failed.
    #[error("{failed} of {attempted} stored files could not be deleted")]
    AdapterDelete {
        /// Number of failed deletes.
        failed: usize,
        /// Number of deletes attempted.
        attempted: usize,
    },

    /// The owning entity has no persisted identifier yet.
    #[error("{model} has no persisted identifier")]
    MissingOwnerId {
        /// Owning model name.
        model: String,
    },

    /// File record store operation failed.
    #[error("file record store error: {0}")]
    Store(String),
}

impl UploadError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create an association resolution error.
    #[must_use]
    pub fn association_resolution(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssociationResolution {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing owner id error.
    #[must_use]
    pub fn missing_owner_id(model: impl Into<String>) -> Self {
        Self::MissingOwnerId {
            model: model.into(),
        }
    }

    /// Create a store error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether this error can only occur during setup.
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::AssociationResolution { .. }
        )
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let msg = err.to_string();
        match err {
            UploadError::InvalidConfiguration { .. } | UploadError::AssociationResolution { .. } => {
                Self::Configuration(msg)
            }
            UploadError::UnknownAdapter(_) => Self::NotFound(msg),
            UploadError::InvalidPayload(_) | UploadError::IncompleteUpload { .. } => {
                Self::Validation(msg)
            }
            UploadError::MissingOwnerId { .. } => Self::BusinessRule(msg),
            UploadError::AdapterWrite { .. } | UploadError::AdapterDelete { .. } => {
                Self::ExternalService(msg)
            }
            UploadError::Store(_) => Self::Database(msg),
            UploadError::ReadPayload { .. } => Self::Internal(msg),
        }
    }
}
