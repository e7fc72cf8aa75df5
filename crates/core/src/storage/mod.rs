//! Storage adapters for uploaded files, built on Apache OpenDAL.
//!
//! Adapters are addressed by name through an [`AdapterRegistry`]; the upload
//! lifecycle never talks to a backend directly. Supported backends:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem
//! - In-process memory (tests, development)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            AdapterRegistry ("Local", "S3", ...)                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ adapter.write("key", bytes)    │ adapter.delete("key")          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      Apache OpenDAL                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod adapter;
mod error;
mod registry;

pub use adapter::{OperatorAdapter, StorageAdapter};
pub use error::StorageError;
pub use filestore_shared::StorageProvider;
pub use registry::AdapterRegistry;
