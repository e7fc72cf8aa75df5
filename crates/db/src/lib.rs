//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - The `file_storage` entity definition
//! - A [`FileStorageRepository`] backing the upload lifecycle's record store
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::FileStorageRepository;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use filestore_shared::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
