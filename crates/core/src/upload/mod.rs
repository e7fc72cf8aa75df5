//! File upload persistence for owning entities.
//!
//! This module attaches upload behaviour to an entity's save/delete
//! lifecycle:
//! - Setup: per-model settings, association resolution, key computers
//! - Upload: write the payload to a storage adapter, record its key
//! - Delete: remove every stored file the owner holds, and its record
//! - Dispatch: run the above only in the configured lifecycle phase

pub mod association;
mod dispatcher;
mod error;
mod key;
mod registry;
mod service;
mod settings;
mod source;
mod store;
mod types;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod testing;

pub use association::{
    AssociationDescriptor, AssociationMapping, AssociationOptions, AssociationSpec, Cardinality,
    ResolvedAssociation,
};
pub use dispatcher::LifecycleDispatcher;
pub use error::UploadError;
pub use key::{KeyComputer, UuidKeyComputer};
pub use registry::{UploadConfiguration, UploadRegistry, UploadRegistryBuilder};
pub use service::UploadService;
pub use settings::{DeleteTrigger, LifecyclePhase, UploadSettings, UploadTrigger};
pub use source::{TempFileSource, UploadSource};
pub use store::FileRecordStore;
pub use types::{
    DeleteReport, FileRecord, FileRecordDraft, HookOutcome, NewFileRecord, OwnerEntity,
    UploadOutcome, UploadPayload,
};
