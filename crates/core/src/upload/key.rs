//! Storage key computation.

use uuid::Uuid;

use super::types::OwnerEntity;

/// Produces the storage key for a new file.
///
/// The returned key is used verbatim; collision-freedom is the
/// implementation's responsibility.
pub trait KeyComputer: Send + Sync {
    /// Compute a key for a file owned by `owner`.
    fn compute(&self, owner: &OwnerEntity) -> String;
}

/// Default strategy: a random UUID in canonical hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyComputer;

impl KeyComputer for UuidKeyComputer {
    fn compute(&self, _owner: &OwnerEntity) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> KeyComputer for F
where
    F: Fn(&OwnerEntity) -> String + Send + Sync,
{
    fn compute(&self, owner: &OwnerEntity) -> String {
        self(owner)
    }
}
