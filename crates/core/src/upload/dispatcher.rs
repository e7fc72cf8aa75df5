//! Lifecycle hook dispatch.
//!
//! The host persistence layer calls one hook per lifecycle point. The
//! dispatcher looks up the owner's [`UploadConfiguration`] and runs the
//! upload or delete orchestration only in the configured phase; every other
//! phase is a no-op. It keeps no state between calls.
//!
//! [`UploadConfiguration`]: super::registry::UploadConfiguration

use std::sync::Arc;

use tracing::debug;

use super::error::UploadError;
use super::registry::UploadRegistry;
use super::service::UploadService;
use super::settings::LifecyclePhase;
use super::store::FileRecordStore;
use super::types::{HookOutcome, OwnerEntity, UploadOutcome};

/// Routes lifecycle hooks to upload and delete orchestration.
pub struct LifecycleDispatcher<S: FileRecordStore> {
    registry: Arc<UploadRegistry>,
    service: UploadService<S>,
}

impl<S: FileRecordStore> LifecycleDispatcher<S> {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(registry: Arc<UploadRegistry>, service: UploadService<S>) -> Self {
        Self { registry, service }
    }

    /// The upload registry.
    #[must_use]
    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    /// The orchestration service.
    #[must_use]
    pub fn service(&self) -> &UploadService<S> {
        &self.service
    }

    /// Hook run before the owner is written.
    ///
    /// # Errors
    ///
    /// Returns the orchestration error of the phase, if it ran.
    pub async fn before_save(&self, owner: &mut OwnerEntity) -> Result<HookOutcome, UploadError> {
        self.dispatch(LifecyclePhase::PreSave, owner).await
    }

    /// Hook run after the owner is written; `owner.id` must be set.
    ///
    /// # Errors
    ///
    /// Returns the orchestration error of the phase, if it ran.
    pub async fn after_save(&self, owner: &mut OwnerEntity) -> Result<HookOutcome, UploadError> {
        self.dispatch(LifecyclePhase::PostSave, owner).await
    }

    /// Hook run before the owner is removed.
    ///
    /// # Errors
    ///
    /// Returns the orchestration error of the phase, if it ran.
    pub async fn before_delete(
        &self,
        owner: &OwnerEntity,
        cascade: bool,
    ) -> Result<HookOutcome, UploadError> {
        self.delete_phase(LifecyclePhase::PreDelete, owner, cascade).await
    }

    /// Hook run after the owner is removed.
    ///
    /// # Errors
    ///
    /// Returns the orchestration error of the phase, if it ran.
    pub async fn after_delete(
        &self,
        owner: &OwnerEntity,
        cascade: bool,
    ) -> Result<HookOutcome, UploadError> {
        self.delete_phase(LifecyclePhase::PostDelete, owner, cascade).await
    }

    /// Run whatever `phase` requires for `owner`.
    ///
    /// Delete phases dispatched this way assume a cascading delete.
    ///
    /// # Errors
    ///
    /// Returns the orchestration error of the phase that ran.
    pub async fn dispatch(
        &self,
        phase: LifecyclePhase,
        owner: &mut OwnerEntity,
    ) -> Result<HookOutcome, UploadError> {
        if !phase.is_save() {
            return self.delete_phase(phase, owner, true).await;
        }

        let Some(config) = self.registry.get(&owner.model) else {
            debug!(model = %owner.model, %phase, "no upload behaviour for model");
            return Ok(HookOutcome::Skipped);
        };

        if config.uploads_in(phase) {
            return self
                .service
                .perform_upload(config, owner)
                .await
                .map(HookOutcome::Upload);
        }

        // A file written in pre_save gets its record once the owner exists.
        if phase == LifecyclePhase::PostSave
            && let Some(record) = self.service.commit_pending(config, owner).await?
        {
            return Ok(HookOutcome::Upload(UploadOutcome::Stored(record)));
        }

        Ok(HookOutcome::Skipped)
    }

    async fn delete_phase(
        &self,
        phase: LifecyclePhase,
        owner: &OwnerEntity,
        cascade: bool,
    ) -> Result<HookOutcome, UploadError> {
        let Some(config) = self.registry.get(&owner.model) else {
            debug!(model = %owner.model, %phase, "no upload behaviour for model");
            return Ok(HookOutcome::Skipped);
        };
        if !config.deletes_in(phase) {
            return Ok(HookOutcome::Skipped);
        }

        debug!(model = %owner.model, %phase, cascade, "deleting stored files");
        self.service
            .perform_delete(config, owner)
            .await
            .map(HookOutcome::Delete)
    }
}
