//! File association resolution.
//!
//! Setup never mutates a host model. It produces [`AssociationDescriptor`]s
//! that the host hands to its own association-registration API, plus the
//! [`ResolvedAssociation`] the lifecycle hooks use to find file records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::UploadError;

/// Name of the association created by automatic binding.
pub const AUTO_ASSOCIATION_NAME: &str = "File";

/// Default file-metadata entity.
pub const FILE_STORAGE_CLASS: &str = "FileStorage";

/// Default foreign key column on the file-metadata entity.
pub const FOREIGN_KEY_COLUMN: &str = "foreign_key";

/// How many file records an owning entity holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one file record.
    HasOne,
    /// Any number of file records.
    HasMany,
}

/// Options for one declared association.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssociationOptions {
    /// File-metadata entity name.
    pub class_name: String,
    /// Foreign key column on the file-metadata entity.
    pub foreign_key: String,
    /// Extra scoping conditions.
    pub conditions: IndexMap<String, serde_json::Value>,
    /// Whether deleting file records cascades back to the owner.
    pub dependent: bool,
}

impl Default for AssociationOptions {
    fn default() -> Self {
        Self {
            class_name: FILE_STORAGE_CLASS.to_string(),
            foreign_key: FOREIGN_KEY_COLUMN.to_string(),
            conditions: IndexMap::new(),
            dependent: false,
        }
    }
}

/// Explicit association declarations, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssociationMapping {
    /// Single-file associations.
    pub has_one: IndexMap<String, AssociationOptions>,
    /// Multi-file associations.
    pub has_many: IndexMap<String, AssociationOptions>,
}

impl AssociationMapping {
    fn declared(&self) -> impl Iterator<Item = (&String, Cardinality, &AssociationOptions)> {
        self.has_one
            .iter()
            .map(|(name, opts)| (name, Cardinality::HasOne, opts))
            .chain(
                self.has_many
                    .iter()
                    .map(|(name, opts)| (name, Cardinality::HasMany, opts)),
            )
    }
}

/// How the file association is established.
///
/// Deserializes from `true` (automatic), `false` (disabled), a string (an
/// existing association name) or a mapping with `has_one`/`has_many`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawAssociationSpec")]
pub enum AssociationSpec {
    /// Bind a `has_many` association named `File` scoped to the owner model.
    #[default]
    Auto,
    /// No automatic binding; `association_name` must name an existing one.
    Disabled,
    /// Use an association the host already declares.
    Named(String),
    /// Declare the given associations.
    Explicit(AssociationMapping),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAssociationSpec {
    Flag(bool),
    Name(String),
    Mapping(AssociationMapping),
}

impl From<RawAssociationSpec> for AssociationSpec {
    fn from(raw: RawAssociationSpec) -> Self {
        match raw {
            RawAssociationSpec::Flag(true) => Self::Auto,
            RawAssociationSpec::Flag(false) => Self::Disabled,
            RawAssociationSpec::Name(name) => Self::Named(name),
            RawAssociationSpec::Mapping(mapping) => Self::Explicit(mapping),
        }
    }
}

/// An association the host persistence layer should register on the owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationDescriptor {
    /// Owning model the association is declared on.
    pub owner: String,
    /// Association name.
    pub name: String,
    /// `has_one` or `has_many`.
    pub cardinality: Cardinality,
    /// File-metadata entity name.
    pub class_name: String,
    /// Foreign key column on the file-metadata entity.
    pub foreign_key: String,
    /// Scoping conditions.
    pub conditions: IndexMap<String, serde_json::Value>,
    /// Whether deleting file records cascades back to the owner.
    pub dependent: bool,
}

/// The association that holds file metadata for an owning model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAssociation {
    /// Association name.
    pub name: String,
    /// Declared cardinality.
    pub cardinality: Cardinality,
}

/// Outcome of association resolution for one owning model.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationResolution {
    /// The association holding file metadata.
    pub resolved: ResolvedAssociation,
    /// Associations the host must register; empty when the association
    /// already exists.
    pub descriptors: Vec<AssociationDescriptor>,
}

/// Resolve the file association for `model`.
///
/// # Errors
///
/// Returns [`UploadError::AssociationResolution`] if no single association
/// name can be determined, and [`UploadError::InvalidConfiguration`] if
/// `association_name` contradicts the declared association.
pub fn resolve(
    model: &str,
    declared: &AssociationSpec,
    association_name: Option<&str>,
) -> Result<AssociationResolution, UploadError> {
    match declared {
        AssociationSpec::Auto => {
            if association_name.is_some_and(|name| name != AUTO_ASSOCIATION_NAME) {
                return Err(UploadError::invalid_configuration(
                    model,
                    "association_name cannot rename the automatic File association",
                ));
            }
            Ok(auto_association(model))
        }
        AssociationSpec::Disabled => match association_name {
            Some(name) => named(model, name),
            None => Err(UploadError::association_resolution(
                model,
                "automatic association disabled and no association_name given",
            )),
        },
        AssociationSpec::Named(name) => {
            if association_name.is_some_and(|other| other != name.as_str()) {
                return Err(UploadError::invalid_configuration(
                    model,
                    format!("association_name conflicts with association {name:?}"),
                ));
            }
            named(model, name)
        }
        AssociationSpec::Explicit(mapping) => explicit(model, mapping, association_name),
    }
}

fn auto_association(model: &str) -> AssociationResolution {
    let mut conditions = IndexMap::new();
    conditions.insert(
        format!("{AUTO_ASSOCIATION_NAME}.model"),
        serde_json::Value::String(model.to_string()),
    );

    AssociationResolution {
        resolved: ResolvedAssociation {
            name: AUTO_ASSOCIATION_NAME.to_string(),
            cardinality: Cardinality::HasMany,
        },
        descriptors: vec![AssociationDescriptor {
            owner: model.to_string(),
            name: AUTO_ASSOCIATION_NAME.to_string(),
            cardinality: Cardinality::HasMany,
            class_name: FILE_STORAGE_CLASS.to_string(),
            foreign_key: FOREIGN_KEY_COLUMN.to_string(),
            conditions,
            dependent: false,
        }],
    }
}

fn named(model: &str, name: &str) -> Result<AssociationResolution, UploadError> {
    if name.trim().is_empty() {
        return Err(UploadError::association_resolution(
            model,
            "association name is empty",
        ));
    }
    // Existing associations are not inspected; treat them as multi-file so
    // delete visits every matching record.
    Ok(AssociationResolution {
        resolved: ResolvedAssociation {
            name: name.to_string(),
            cardinality: Cardinality::HasMany,
        },
        descriptors: Vec::new(),
    })
}

fn explicit(
    model: &str,
    mapping: &AssociationMapping,
    association_name: Option<&str>,
) -> Result<AssociationResolution, UploadError> {
    let descriptors: Vec<AssociationDescriptor> = mapping
        .declared()
        .map(|(name, cardinality, opts)| AssociationDescriptor {
            owner: model.to_string(),
            name: name.clone(),
            cardinality,
            class_name: opts.class_name.clone(),
            foreign_key: opts.foreign_key.clone(),
            conditions: opts.conditions.clone(),
            dependent: opts.dependent,
        })
        .collect();
    if descriptors.iter().any(|d| d.name.trim().is_empty()) {
        return Err(UploadError::association_resolution(
            model,
            "mapping declares an association with an empty name",
        ));
    }

    let chosen = match association_name {
        Some(wanted) => descriptors.iter().find(|d| d.name == wanted).ok_or_else(|| {
            UploadError::association_resolution(
                model,
                format!("association_name {wanted:?} is not declared in the mapping"),
            )
        })?,
        None if !mapping.has_one.is_empty() && !mapping.has_many.is_empty() => {
            return Err(UploadError::association_resolution(
                model,
                "mapping declares both has_one and has_many; set association_name",
            ));
        }
        None => descriptors.first().ok_or_else(|| {
            UploadError::association_resolution(model, "mapping declares no associations")
        })?,
    };

    let resolved = ResolvedAssociation {
        name: chosen.name.clone(),
        cardinality: chosen.cardinality,
    };
    Ok(AssociationResolution {
        resolved,
        descriptors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: serde_json::Value) -> AssociationSpec {
        serde_json::from_value(raw).expect("valid association")
    }

    #[test]
    fn test_association_forms_deserialize() {
        assert_eq!(parse(json!(true)), AssociationSpec::Auto);
        assert_eq!(parse(json!(false)), AssociationSpec::Disabled);
        assert_eq!(parse(json!("Image")), AssociationSpec::Named("Image".into()));
        assert!(matches!(
            parse(json!({"has_one": {"Avatar": {}}})),
            AssociationSpec::Explicit(_)
        ));
    }

    #[test]
    fn test_mapping_rejects_unknown_keys() {
        let result: Result<AssociationSpec, _> =
            serde_json::from_value(json!({"belongs_to": {"Owner": {}}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_auto_binds_file_has_many_scoped_to_model() {
        let resolution = resolve("Item", &AssociationSpec::Auto, None).unwrap();

        assert_eq!(resolution.resolved.name, "File");
        assert_eq!(resolution.resolved.cardinality, Cardinality::HasMany);
        assert_eq!(resolution.descriptors.len(), 1);

        let descriptor = &resolution.descriptors[0];
        assert_eq!(descriptor.owner, "Item");
        assert_eq!(descriptor.class_name, "FileStorage");
        assert_eq!(descriptor.foreign_key, "foreign_key");
        assert_eq!(descriptor.conditions["File.model"], json!("Item"));
        assert!(!descriptor.dependent);
    }

    #[test]
    fn test_auto_rejects_renaming() {
        let err = resolve("Item", &AssociationSpec::Auto, Some("Image")).unwrap_err();
        assert!(matches!(err, UploadError::InvalidConfiguration { .. }));
        assert!(resolve("Item", &AssociationSpec::Auto, Some("File")).is_ok());
    }

    #[test]
    fn test_named_uses_existing_association() {
        let resolution = resolve("Item", &parse(json!("Image")), None).unwrap();
        assert_eq!(resolution.resolved.name, "Image");
        assert_eq!(resolution.resolved.cardinality, Cardinality::HasMany);
        assert!(resolution.descriptors.is_empty());
    }

    #[test]
    fn test_named_rejects_empty_name() {
        let err = resolve("Item", &parse(json!("")), None).unwrap_err();
        assert!(matches!(err, UploadError::AssociationResolution { .. }));
    }

    #[test]
    fn test_explicit_rejects_empty_association_key() {
        for key in ["", "   "] {
            let mapping = parse(json!({"has_many": {key: {}}}));
            let err = resolve("Item", &mapping, None).unwrap_err();
            assert!(matches!(err, UploadError::AssociationResolution { .. }));

            let err = resolve("Item", &mapping, Some(key)).unwrap_err();
            assert!(matches!(err, UploadError::AssociationResolution { .. }));
        }
    }

    #[test]
    fn test_disabled_requires_association_name() {
        let err = resolve("Item", &AssociationSpec::Disabled, None).unwrap_err();
        assert!(matches!(err, UploadError::AssociationResolution { .. }));

        let resolution = resolve("Item", &AssociationSpec::Disabled, Some("Scan")).unwrap();
        assert_eq!(resolution.resolved.name, "Scan");
    }

    #[test]
    fn test_explicit_has_one() {
        let mapping = parse(json!({
            "has_one": {
                "Avatar": {
                    "class_name": "FileStorage",
                    "conditions": {"Avatar.model": "User"}
                }
            }
        }));
        let resolution = resolve("User", &mapping, None).unwrap();

        assert_eq!(resolution.resolved.name, "Avatar");
        assert_eq!(resolution.resolved.cardinality, Cardinality::HasOne);
        assert_eq!(resolution.descriptors.len(), 1);
        assert_eq!(resolution.descriptors[0].conditions["Avatar.model"], json!("User"));
        assert_eq!(resolution.descriptors[0].foreign_key, "foreign_key");
    }

    #[test]
    fn test_explicit_first_declared_key_wins() {
        let mapping = parse(json!({
            "has_many": {
                "Scan": {},
                "Attachment": {}
            }
        }));
        let resolution = resolve("Item", &mapping, None).unwrap();
        assert_eq!(resolution.resolved.name, "Scan");
        assert_eq!(resolution.descriptors.len(), 2);
    }

    #[test]
    fn test_explicit_both_kinds_need_disambiguation() {
        let mapping = parse(json!({
            "has_one": {"Cover": {}},
            "has_many": {"Gallery": {}}
        }));

        let err = resolve("Album", &mapping, None).unwrap_err();
        assert!(matches!(err, UploadError::AssociationResolution { .. }));

        let resolution = resolve("Album", &mapping, Some("Gallery")).unwrap();
        assert_eq!(resolution.resolved.name, "Gallery");
        assert_eq!(resolution.resolved.cardinality, Cardinality::HasMany);
        assert_eq!(resolution.descriptors.len(), 2);
    }

    #[test]
    fn test_explicit_unknown_association_name() {
        let mapping = parse(json!({"has_one": {"Cover": {}}}));
        let err = resolve("Album", &mapping, Some("Gallery")).unwrap_err();
        assert!(err.to_string().contains("Gallery"));
    }

    #[test]
    fn test_explicit_empty_mapping() {
        let err = resolve("Album", &parse(json!({})), None).unwrap_err();
        assert!(matches!(err, UploadError::AssociationResolution { .. }));
    }
}
