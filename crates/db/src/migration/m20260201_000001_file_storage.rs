//! File storage migration.
//!
//! Creates the table holding one row per stored file.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FILE_STORAGE_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS file_storage CASCADE;")
            .await?;
        Ok(())
    }
}

const FILE_STORAGE_SQL: &str = r"
-- One row per stored file, keyed to its owner by (model, foreign_key)
CREATE TABLE file_storage (
    id UUID PRIMARY KEY,
    model VARCHAR(255) NOT NULL,
    foreign_key VARCHAR(255) NOT NULL,
    path TEXT NOT NULL,
    adapter VARCHAR(64) NOT NULL,
    filename TEXT,
    mime_type VARCHAR(255),
    filesize BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_filesize_non_negative CHECK (filesize >= 0)
);

-- Owner lookup, oldest first
CREATE INDEX idx_file_storage_owner ON file_storage(model, foreign_key, created_at);
";
