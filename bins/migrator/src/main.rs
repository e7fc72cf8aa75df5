//! Database migration runner for Filestore.
//!
//! Creates and drops the `file_storage` table.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use filestore_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // sea-orm-migration reads DATABASE_URL and sets up its own tracing
    cli::run_cli(Migrator).await;
}
