//! Sparse-set entity-component-system runtime.
//!
//! Contains entity identity and allocation, typed component storage with
//! change-tick tracking, a deferred command buffer, typed relations with
//! cascade-delete semantics, per-component observers, queries, a phased
//! system scheduler, and prefab inheritance.

pub mod command;
pub mod component;
pub mod entity;
pub mod error;
pub mod observer;
pub mod prefab;
pub mod query;
pub mod relation;
pub mod scheduler;
pub mod sparse_set;
pub mod world;

pub use command::{CommandBuffer, EntityRef};
pub use component::{AnyStore, Component, ComponentStore};
pub use entity::{CapacityExceeded, EntityId, EntityManager, MAX_ENTITIES, NULL_ENTITY};
pub use error::{CapacityError, RelationError, SystemRegistrationError};
pub use observer::{ObserverHandle, Observers};
pub use prefab::{PrefabBuilder, PrefabError, PrefabRegistry, TemplateId};
pub use query::Query;
pub use relation::{RelationStore, RelationTypeDef, CHILD_OF, CONTAINS, TARGETS};
pub use scheduler::{Phase, Scheduler, SystemFn};
pub use sparse_set::SparseSet;
pub use world::World;

/// Runtime crate version, surfaced the way the ambient stack's other
/// crates surface theirs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
