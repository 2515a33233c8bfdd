use glam::Vec2;
use thiserror::Error;

use super::node::TransformId;

/// Failures reported by [`TransformTree`](super::TransformTree).
///
/// Mutations that would break an invariant fail closed: the tree is left
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Reparenting `child` under `parent` would make `child` its own ancestor.
    #[error("reparenting {child} under {parent} would create a cycle")]
    CycleRejected {
        child: TransformId,
        parent: TransformId,
    },
    /// World scale of `id` has a zero component, so it has no inverse.
    #[error("world scale ({}, {}) of {id} cannot be inverted", .scale.x, .scale.y)]
    DegenerateTransform { id: TransformId, scale: Vec2 },
    /// `child` is listed under `parent` but does not point back to it,
    /// or the parent links contain a loop.
    #[error("{child} is listed as a child of {parent} but does not point back to it")]
    StructuralInconsistency {
        parent: TransformId,
        child: TransformId,
    },
    /// The handle refers to a removed transform.
    #[error("{0} does not refer to a live transform")]
    Stale(TransformId),
    /// Removal refused because the orphan policy forbids orphaning children.
    #[error("{id} still has {count} children")]
    HasChildren { id: TransformId, count: usize },
}
