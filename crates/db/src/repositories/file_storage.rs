//! File storage repository for database operations.
//!
//! Implements the upload lifecycle's record store using `SeaORM`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::debug;

use crate::entities::file_storage;
use filestore_core::upload::{
    Cardinality, FileRecord, FileRecordStore, NewFileRecord, ResolvedAssociation, UploadError,
};
use filestore_shared::types::FileRecordId;

/// File storage repository implementation.
#[derive(Debug, Clone)]
pub struct FileStorageRepository {
    db: DatabaseConnection,
}

impl FileStorageRepository {
    /// Create a new file storage repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl FileRecordStore for FileStorageRepository {
    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, UploadError> {
        let filesize = i64::try_from(input.filesize)
            .map_err(|_| UploadError::store(format!("file size {} out of range", input.filesize)))?;

        let active_model = file_storage::ActiveModel {
            id: Set(input.id.into_inner()),
            model: Set(input.model),
            foreign_key: Set(input.foreign_key),
            path: Set(input.path),
            adapter: Set(input.adapter),
            filename: Set(input.filename),
            mime_type: Set(input.mime_type),
            filesize: Set(filesize),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| UploadError::store(e.to_string()))?;

        Ok(to_domain(model))
    }

    /// Scoped by `model` and `foreign_key`; descriptor conditions are left to
    /// the host's association registration.
    async fn find(
        &self,
        association: &ResolvedAssociation,
        model: &str,
        foreign_key: &str,
    ) -> Result<Vec<FileRecord>, UploadError> {
        let mut query = file_storage::Entity::find()
            .filter(file_storage::Column::Model.eq(model))
            .filter(file_storage::Column::ForeignKey.eq(foreign_key))
            .order_by_asc(file_storage::Column::CreatedAt)
            .order_by_asc(file_storage::Column::Id);
        if association.cardinality == Cardinality::HasOne {
            query = query.limit(1);
        }

        let models = query
            .all(&self.db)
            .await
            .map_err(|e| UploadError::store(e.to_string()))?;

        debug!(
            association = %association.name,
            model,
            foreign_key,
            found = models.len(),
            "Loaded file records"
        );
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn delete(&self, id: FileRecordId) -> Result<bool, UploadError> {
        let result = file_storage::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(|e| UploadError::store(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert database model to domain record.
fn to_domain(model: file_storage::Model) -> FileRecord {
    FileRecord {
        id: FileRecordId::from_uuid(model.id),
        model: model.model,
        foreign_key: model.foreign_key,
        path: model.path,
        adapter: model.adapter,
        filename: model.filename,
        mime_type: model.mime_type,
        // chk_filesize_non_negative guarantees the conversion
        filesize: u64::try_from(model.filesize).unwrap_or_default(),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn row(id: Uuid, path: &str) -> file_storage::Model {
        file_storage::Model {
            id,
            model: "Item".to_string(),
            foreign_key: "1".to_string(),
            path: path.to_string(),
            adapter: "Local".to_string(),
            filename: Some("photo.png".to_string()),
            mime_type: Some("image/png".to_string()),
            filesize: 42,
            created_at: Utc::now().into(),
        }
    }

    fn has_many() -> ResolvedAssociation {
        ResolvedAssociation {
            name: "File".to_string(),
            cardinality: Cardinality::HasMany,
        }
    }

    #[tokio::test]
    async fn test_create_returns_inserted_record() {
        let id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(id, "key-1")]])
            .into_connection();
        let repo = FileStorageRepository::new(db);

        let record = repo
            .create(NewFileRecord {
                id: FileRecordId::from_uuid(id),
                model: "Item".to_string(),
                foreign_key: "1".to_string(),
                path: "key-1".to_string(),
                adapter: "Local".to_string(),
                filename: Some("photo.png".to_string()),
                mime_type: Some("image/png".to_string()),
                filesize: 42,
            })
            .await
            .unwrap();

        assert_eq!(record.id, FileRecordId::from_uuid(id));
        assert_eq!(record.path, "key-1");
        assert_eq!(record.filesize, 42);
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_file() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = FileStorageRepository::new(db);

        let err = repo
            .create(NewFileRecord {
                id: FileRecordId::new(),
                model: "Item".to_string(),
                foreign_key: "1".to_string(),
                path: "key-1".to_string(),
                adapter: "Local".to_string(),
                filename: None,
                mime_type: None,
                filesize: u64::MAX,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Store(_)));
    }

    #[tokio::test]
    async fn test_find_maps_rows_in_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                row(Uuid::now_v7(), "key-1"),
                row(Uuid::now_v7(), "key-2"),
            ]])
            .into_connection();
        let repo = FileStorageRepository::new(db);

        let records = repo.find(&has_many(), "Item", "1").await.unwrap();

        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["key-1", "key-2"]);
        assert!(records.iter().all(|r| r.model == "Item"));
    }

    #[tokio::test]
    async fn test_find_has_one_limits_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(Uuid::now_v7(), "key-1")]])
            .into_connection();
        let repo = FileStorageRepository::new(db.clone());
        let association = ResolvedAssociation {
            name: "Avatar".to_string(),
            cardinality: Cardinality::HasOne,
        };

        let records = repo.find(&association, "Item", "1").await.unwrap();
        assert_eq!(records.len(), 1);

        let log = db.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("LIMIT"));
    }

    #[tokio::test]
    async fn test_find_scopes_by_owner_only() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<file_storage::Model>::new()])
            .into_connection();
        let repo = FileStorageRepository::new(db.clone());
        let association = ResolvedAssociation {
            name: "Gallery".to_string(),
            cardinality: Cardinality::HasMany,
        };

        let records = repo.find(&association, "Album", "7").await.unwrap();
        assert!(records.is_empty());

        // Debug output escapes the quoted identifiers.
        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains(r#"model\" = $1"#));
        assert!(sql.contains(r#"foreign_key\" = $2"#));
        assert!(sql.contains("ORDER BY"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("Gallery"));
    }

    #[tokio::test]
    async fn test_delete_reports_affected_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let repo = FileStorageRepository::new(db);

        assert!(repo.delete(FileRecordId::new()).await.unwrap());
        assert!(!repo.delete(FileRecordId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_database_error_maps_to_store_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repo = FileStorageRepository::new(db);

        let err = repo.find(&has_many(), "Item", "1").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
