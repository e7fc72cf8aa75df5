//! Shared types, errors, and configuration for Filestore.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management (database, storage adapters, upload bindings)

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, StorageProvider, UploadBinding};
pub use error::{AppError, AppResult};
