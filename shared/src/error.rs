//! Shared error taxonomy (§7). Split by subsystem rather than one giant
//! enum.

use thiserror::Error;

use crate::types::EntityId;

/// Consistency-violation kind: component-type mismatch, missing required
/// component. Handling policy (§7): early-return, log a structured event,
/// continue the tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity {entity} does not exist")]
    UnknownEntity { entity: EntityId },

    #[error("entity {entity} has no component of kind {kind}")]
    MissingComponent { entity: EntityId, kind: &'static str },

    #[error("entity {entity} already has a component of kind {kind}")]
    DuplicateComponent { entity: EntityId, kind: &'static str },
}

/// Determinism-violation kind (§7): "fail fast in tests; never in
/// production paths". Production generator code should not be able to
/// construct one of these; it exists so tests can assert the invariant
/// directly (e.g. an RNG split that produced two equal streams).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generator {generator} produced a non-walkable spawn tile at ({x}, {y})")]
    UnwalkableSpawn { generator: &'static str, x: i32, y: i32 },

    #[error("rng split for kind '{kind}' collided with an existing child stream")]
    RngSplitCollision { kind: String },
}
