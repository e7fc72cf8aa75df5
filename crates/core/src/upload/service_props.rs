//! Property-based tests for upload and delete orchestration.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use crate::storage::AdapterRegistry;
use crate::upload::association::{AUTO_ASSOCIATION_NAME, Cardinality};
use crate::upload::error::UploadError;
use crate::upload::key::{KeyComputer, UuidKeyComputer};
use crate::upload::registry::UploadRegistry;
use crate::upload::service::UploadService;
use crate::upload::testing::{FailingAdapter, MemoryFileRecordStore, RecordingAdapter};
use crate::upload::types::OwnerEntity;

/// Strategy for owning model names.
fn arb_model() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{0,15}"
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Automatic binding always yields `File`, scoped to the owning model.
    #[test]
    fn prop_auto_association_scoped_to_model(model in arb_model()) {
        let registry = UploadRegistry::builder()
            .register(&model, &json!({}))
            .unwrap()
            .build();
        let config = registry.get(&model).unwrap();

        prop_assert_eq!(config.association.name.as_str(), AUTO_ASSOCIATION_NAME);
        prop_assert_eq!(config.association.cardinality, Cardinality::HasMany);
        prop_assert_eq!(
            &config.descriptors[0].conditions["File.model"],
            &json!(model)
        );
    }

    /// Default keys are canonical UUID strings, never repeated for an owner.
    #[test]
    fn prop_default_keys_are_canonical_and_distinct(model in arb_model(), id in "[0-9]{1,6}") {
        let owner = OwnerEntity::new(model).with_id(id);
        let first = UuidKeyComputer.compute(&owner);
        let second = UuidKeyComputer.compute(&owner);

        let parsed = uuid::Uuid::parse_str(&first).unwrap();
        prop_assert_eq!(parsed.hyphenated().to_string(), first.clone());
        prop_assert_ne!(first, second);
    }

    /// Every matched record gets a delete attempt; the phase fails iff any
    /// attempt failed, and exactly the failed records remain.
    #[test]
    fn prop_delete_attempts_every_record(failures in prop::collection::vec(any::<bool>(), 0..12)) {
        let good = Arc::new(RecordingAdapter::default());
        let adapters = AdapterRegistry::new()
            .with_adapter("Local", good.clone())
            .with_adapter("Broken", Arc::new(FailingAdapter));
        let service = UploadService::new(
            Arc::new(adapters),
            Arc::new(MemoryFileRecordStore::default()),
        );
        for (i, fails) in failures.iter().enumerate() {
            let adapter = if *fails { "Broken" } else { "Local" };
            service.store().insert("Item", "1", &format!("key-{i}"), adapter);
        }
        let registry = UploadRegistry::builder()
            .register("Item", &json!({}))
            .unwrap()
            .build();
        let config = registry.get("Item").unwrap();
        let owner = OwnerEntity::new("Item").with_id("1");

        let result = runtime().block_on(service.perform_delete(config, &owner));

        let expected_failed = failures.iter().filter(|f| **f).count();
        let expected_removed = failures.len() - expected_failed;
        prop_assert_eq!(good.deletes().len(), expected_removed);
        prop_assert_eq!(service.store().len(), expected_failed);
        match result {
            Ok(report) => {
                prop_assert_eq!(expected_failed, 0);
                prop_assert_eq!(report.matched, failures.len());
                prop_assert_eq!(report.removed, expected_removed);
            }
            Err(UploadError::AdapterDelete { failed, attempted }) => {
                prop_assert_eq!(failed, expected_failed);
                prop_assert_eq!(attempted, failures.len());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
