//! Storage adapter interface and its OpenDAL implementation.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};

use super::error::StorageError;
use filestore_shared::StorageProvider;

/// Byte storage addressed by key.
///
/// Implementations own their concurrency and timeout behaviour; callers
/// await each operation inline.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Store `content` under `key`, replacing any previous object.
    async fn write(&self, key: &str, content: Bytes) -> Result<(), StorageError>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage adapter backed by an OpenDAL operator.
#[derive(Debug, Clone)]
pub struct OperatorAdapter {
    operator: Operator,
    kind: &'static str,
}

impl OperatorAdapter {
    /// Create an adapter from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        let operator = Self::create_operator(provider)?;
        Ok(Self {
            operator,
            kind: provider.kind(),
        })
    }

    /// Create an in-process memory adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory service cannot be initialized.
    pub fn memory() -> Result<Self, StorageError> {
        Self::from_provider(&StorageProvider::Memory)
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };
        Ok(operator)
    }

    /// Read the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be read.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        validate_key(key)?;
        let buffer = self.operator.read(key).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::not_found(key)
            } else {
                StorageError::from(e)
            }
        })?;
        Ok(buffer.to_bytes())
    }

    /// Check if an object exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Get the storage provider kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

#[async_trait]
impl StorageAdapter for OperatorAdapter {
    async fn write(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        validate_key(key)?;
        self.operator.write(key, content).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.operator.delete(key).await?;
        Ok(())
    }
}

/// Reject keys that do not address a single object.
///
/// Empty keys address the backend root and keys ending in `/` address a
/// directory.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() || key.ends_with('/') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
