//! Per-model upload configuration and the registry that holds it.
//!
//! The registry is populated once at setup and never mutated afterwards; the
//! dispatcher receives it explicitly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use filestore_shared::UploadBinding;
use tracing::debug;

use super::association::{self, AssociationDescriptor, ResolvedAssociation};
use super::error::UploadError;
use super::key::{KeyComputer, UuidKeyComputer};
use super::settings::{DeleteTrigger, LifecyclePhase, UploadSettings, UploadTrigger};
use super::types::OwnerEntity;

/// Resolved, immutable upload configuration for one owning model.
#[derive(Clone)]
pub struct UploadConfiguration {
    /// Owning model name.
    pub model: String,
    /// Payload attribute holding the raw upload.
    pub file_field: String,
    /// Attribute that receives the storage key.
    pub path_field: String,
    /// Storage adapter name.
    pub adapter_name: String,
    /// Phase that performs the upload.
    pub upload_trigger: UploadTrigger,
    /// Phase that performs the delete.
    pub delete_trigger: DeleteTrigger,
    /// Association holding file metadata.
    pub association: ResolvedAssociation,
    /// Associations the host must register.
    pub descriptors: Vec<AssociationDescriptor>,
    key_computer: Arc<dyn KeyComputer>,
    key_computer_name: Option<String>,
}

impl UploadConfiguration {
    /// Merge `raw` over the defaults and resolve the file association.
    ///
    /// `key_computers` holds the named strategies `key_computer` may select.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidConfiguration`] for malformed settings
    /// or an unregistered key computer, and
    /// [`UploadError::AssociationResolution`] if no association name results.
    pub fn setup(
        model: &str,
        raw: &serde_json::Value,
        key_computers: &HashMap<String, Arc<dyn KeyComputer>>,
    ) -> Result<Self, UploadError> {
        if model.trim().is_empty() {
            return Err(UploadError::invalid_configuration(model, "model name is empty"));
        }

        let settings = UploadSettings::from_value(model, raw)?;
        let resolution = association::resolve(
            model,
            &settings.association,
            settings.association_name.as_deref(),
        )?;

        let key_computer: Arc<dyn KeyComputer> = match &settings.key_computer {
            Some(name) => key_computers.get(name).cloned().ok_or_else(|| {
                UploadError::invalid_configuration(
                    model,
                    format!("key computer {name:?} is not registered"),
                )
            })?,
            None => Arc::new(UuidKeyComputer),
        };

        Ok(Self {
            model: model.to_string(),
            file_field: settings.file_field,
            path_field: settings.path_field,
            adapter_name: settings.adapter_name,
            upload_trigger: settings.upload_trigger,
            delete_trigger: settings.delete_trigger,
            association: resolution.resolved,
            descriptors: resolution.descriptors,
            key_computer,
            key_computer_name: settings.key_computer,
        })
    }

    /// Compute the storage key for a new file owned by `owner`.
    pub fn compute_key(&self, owner: &OwnerEntity) -> String {
        self.key_computer.compute(owner)
    }

    /// Whether uploads run in `phase`.
    #[must_use]
    pub fn uploads_in(&self, phase: LifecyclePhase) -> bool {
        self.upload_trigger.phase() == phase
    }

    /// Whether deletes run in `phase`.
    #[must_use]
    pub fn deletes_in(&self, phase: LifecyclePhase) -> bool {
        self.delete_trigger.phase() == phase
    }
}

impl fmt::Debug for UploadConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfiguration")
            .field("model", &self.model)
            .field("file_field", &self.file_field)
            .field("path_field", &self.path_field)
            .field("adapter_name", &self.adapter_name)
            .field("upload_trigger", &self.upload_trigger)
            .field("delete_trigger", &self.delete_trigger)
            .field("association", &self.association)
            .field(
                "key_computer",
                &self.key_computer_name.as_deref().unwrap_or("uuid"),
            )
            .finish_non_exhaustive()
    }
}

/// Upload configurations keyed by owning model name.
#[derive(Debug, Clone, Default)]
pub struct UploadRegistry {
    configs: HashMap<String, Arc<UploadConfiguration>>,
}

impl UploadRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> UploadRegistryBuilder {
        UploadRegistryBuilder::default()
    }

    /// Build a registry from configuration-file bindings with the default
    /// key computer only.
    ///
    /// # Errors
    ///
    /// Returns the first setup error encountered.
    pub fn from_bindings(bindings: &[UploadBinding]) -> Result<Self, UploadError> {
        Ok(Self::builder().register_all(bindings)?.build())
    }

    /// Look up the configuration for `model`.
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&UploadConfiguration> {
        self.configs.get(model).map(Arc::as_ref)
    }

    /// Every association descriptor the host must register.
    pub fn descriptors(&self) -> impl Iterator<Item = &AssociationDescriptor> {
        self.configs.values().flat_map(|config| config.descriptors.iter())
    }

    /// Registered model names, sorted.
    #[must_use]
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }

    /// Number of registered models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Whether no model is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Builder for [`UploadRegistry`].
///
/// Named key computers must be added before the models that select them.
#[derive(Default)]
pub struct UploadRegistryBuilder {
    key_computers: HashMap<String, Arc<dyn KeyComputer>>,
    configs: HashMap<String, Arc<UploadConfiguration>>,
}

impl UploadRegistryBuilder {
    /// Make a key computer selectable by `name`.
    #[must_use]
    pub fn key_computer(mut self, name: impl Into<String>, computer: Arc<dyn KeyComputer>) -> Self {
        self.key_computers.insert(name.into(), computer);
        self
    }

    /// Set up the upload behaviour for `model`.
    ///
    /// # Errors
    ///
    /// Returns a setup error if the settings are invalid or `model` is
    /// already registered.
    pub fn register(mut self, model: &str, raw: &serde_json::Value) -> Result<Self, UploadError> {
        if self.configs.contains_key(model) {
            return Err(UploadError::invalid_configuration(model, "model is already registered"));
        }

        let config = UploadConfiguration::setup(model, raw, &self.key_computers)?;
        debug!(
            model,
            association = %config.association.name,
            adapter = %config.adapter_name,
            upload_trigger = %config.upload_trigger.phase(),
            delete_trigger = %config.delete_trigger.phase(),
            "upload behaviour registered"
        );
        self.configs.insert(model.to_string(), Arc::new(config));
        Ok(self)
    }

    /// Register every binding in order.
    ///
    /// # Errors
    ///
    /// Returns the first setup error encountered.
    pub fn register_all(self, bindings: &[UploadBinding]) -> Result<Self, UploadError> {
        bindings
            .iter()
            .try_fold(self, |builder, binding| builder.register(&binding.model, &binding.settings))
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> UploadRegistry {
        UploadRegistry {
            configs: self.configs,
        }
    }
}

impl fmt::Debug for UploadRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRegistryBuilder")
            .field("key_computers", &self.key_computers.keys().collect::<Vec<_>>())
            .field("configs", &self.configs)
            .finish()
    }
}
