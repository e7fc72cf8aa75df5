//! Access to uploaded bytes at their temporary location.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::UploadError;
use super::types::UploadPayload;

/// Reads the raw bytes of an upload.
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Read the full content described by `payload`.
    async fn read(&self, payload: &UploadPayload) -> Result<Bytes, UploadError>;
}

/// Reads uploads from the local temporary file named by `tmp_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TempFileSource;

#[async_trait]
impl UploadSource for TempFileSource {
    async fn read(&self, payload: &UploadPayload) -> Result<Bytes, UploadError> {
        tokio::fs::read(&payload.tmp_name)
            .await
            .map(Bytes::from)
            .map_err(|source| UploadError::ReadPayload {
                path: payload.tmp_name.clone(),
                source,
            })
    }
}
