//! Upload settings, lifecycle phases and their defaults.

use serde::{Deserialize, Serialize};

use super::association::AssociationSpec;
use super::error::UploadError;

/// A point in the owning entity's persistence lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Before the owning entity is written.
    PreSave,
    /// After the owning entity is written and has an identifier.
    PostSave,
    /// Before the owning entity is removed.
    PreDelete,
    /// After the owning entity is removed.
    PostDelete,
}

impl LifecyclePhase {
    /// Every phase, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::PreSave, Self::PostSave, Self::PreDelete, Self::PostDelete];

    /// Convert to settings string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreSave => "pre_save",
            Self::PostSave => "post_save",
            Self::PreDelete => "pre_delete",
            Self::PostDelete => "post_delete",
        }
    }

    /// Whether the phase belongs to a save operation.
    #[must_use]
    pub fn is_save(&self) -> bool {
        matches!(self, Self::PreSave | Self::PostSave)
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase in which the upload is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadTrigger {
    /// Write before the owning entity exists; the record is committed later.
    PreSave,
    /// Write once the owning entity has an identifier.
    #[default]
    PostSave,
}

impl UploadTrigger {
    /// The lifecycle phase this trigger fires on.
    #[must_use]
    pub fn phase(self) -> LifecyclePhase {
        match self {
            Self::PreSave => LifecyclePhase::PreSave,
            Self::PostSave => LifecyclePhase::PostSave,
        }
    }
}

/// Phase in which stored files are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteTrigger {
    /// Delete before the owning entity is removed.
    PreDelete,
    /// Delete after the owning entity is removed.
    #[default]
    PostDelete,
}

impl DeleteTrigger {
    /// The lifecycle phase this trigger fires on.
    #[must_use]
    pub fn phase(self) -> LifecyclePhase {
        match self {
            Self::PreDelete => LifecyclePhase::PreDelete,
            Self::PostDelete => LifecyclePhase::PostDelete,
        }
    }
}

/// Raw per-model settings, merged over defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadSettings {
    /// Payload attribute holding the raw upload.
    pub file_field: String,
    /// Attribute that receives the resolved storage key.
    pub path_field: String,
    /// Storage adapter name.
    pub adapter_name: String,
    /// Phase that performs the upload.
    pub upload_trigger: UploadTrigger,
    /// Phase that performs the delete.
    pub delete_trigger: DeleteTrigger,
    /// How the file association is established.
    pub association: AssociationSpec,
    /// Explicit association name; disambiguates mappings and names the
    /// association when automatic binding is disabled.
    pub association_name: Option<String>,
    /// Name of a registered key computer overriding the default.
    pub key_computer: Option<String>,
}

impl UploadSettings {
    /// Default payload field.
    pub const DEFAULT_FILE_FIELD: &'static str = "file";
    /// Default path field.
    pub const DEFAULT_PATH_FIELD: &'static str = "path";
    /// Default adapter name.
    pub const DEFAULT_ADAPTER: &'static str = "Local";

    /// Parse settings for `model` from a raw mapping.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidConfiguration`] if `raw` is not a
    /// mapping, carries unknown keys or values of the wrong type, or leaves a
    /// required name empty.
    pub fn from_value(model: &str, raw: &serde_json::Value) -> Result<Self, UploadError> {
        if !raw.is_object() {
            return Err(UploadError::invalid_configuration(
                model,
                "settings must be passed as a mapping",
            ));
        }

        let settings: Self = serde_json::from_value(raw.clone())
            .map_err(|e| UploadError::invalid_configuration(model, e.to_string()))?;

        for (field, value) in [
            ("file_field", &settings.file_field),
            ("path_field", &settings.path_field),
            ("adapter_name", &settings.adapter_name),
        ] {
            if value.trim().is_empty() {
                return Err(UploadError::invalid_configuration(
                    model,
                    format!("{field} must not be empty"),
                ));
            }
        }

        Ok(settings)
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            file_field: Self::DEFAULT_FILE_FIELD.to_string(),
            path_field: Self::DEFAULT_PATH_FIELD.to_string(),
            adapter_name: Self::DEFAULT_ADAPTER.to_string(),
            upload_trigger: UploadTrigger::default(),
            delete_trigger: DeleteTrigger::default(),
            association: AssociationSpec::default(),
            association_name: None,
            key_computer: None,
        }
    }
}
