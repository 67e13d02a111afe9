//! Error taxonomy for the ECS runtime: capacity exhaustion, relation
//! conflicts, and system registration conflicts, generalized from
//! archetype component-writer conflicts to the phase scheduler's
//! dependency graph.

use thiserror::Error;

/// Fatal: the world has exhausted entity or component capacity. This class
/// is not retried by callers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("entity capacity exceeded: {0} index slots already allocated")]
    Entities(u32),
}

/// Errors raised by relation mutation (`setParent`/`reparent`-style calls).
/// Returned without mutating any state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelationError {
    #[error("entity cannot be related to itself")]
    SelfParent,
    #[error("relating these entities would create a cycle")]
    CycleDetected,
}

/// Errors raised when registering a system with the `Scheduler`.
#[derive(Debug, Error)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("system '{name}' declares a dependency on unknown system '{dependency}'")]
    UnknownDependency { name: String, dependency: String },
}
