//! Core upload lifecycle logic for filestore.
//!
//! This crate holds the storage adapters and the upload behaviour, with no
//! database dependencies. Persistence of file records goes through the
//! [`upload::FileRecordStore`] trait, implemented in `filestore-db`.
//!
//! # Modules
//!
//! - `storage` - Named storage adapters backed by `OpenDAL`
//! - `upload` - Setup, key computation, upload/delete orchestration and
//!   lifecycle dispatch

pub mod storage;
pub mod upload;
