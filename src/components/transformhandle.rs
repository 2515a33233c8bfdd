//! Link between an entity and its node in the transform tree.
//!
//! The owning entity holds a [`TransformHandle`]; the node itself lives in
//! the [`TransformTree`](crate::resources::transformtree::TransformTree)
//! resource. Each handle value owns its node: when the component is
//! overwritten, removed, or despawned with its entity, the
//! [`release_transform_on_replace`](crate::systems::transformlifecycle::release_transform_on_replace)
//! observer frees the node.

use bevy_ecs::prelude::Component;

use crate::resources::transformtree::{Pose, TransformId, TransformTree};

/// Component pointing at the entity's transform node.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransformHandle {
    pub id: TransformId,
}

impl TransformHandle {
    pub fn new(id: TransformId) -> Self {
        Self { id }
    }

    /// Allocate a node with identity local values and wrap it.
    pub fn create(tree: &mut TransformTree) -> Self {
        Self::new(tree.insert())
    }

    /// Allocate a node with the given local pose and wrap it.
    pub fn create_with(tree: &mut TransformTree, local: Pose) -> Self {
        Self::new(tree.insert_with(local))
    }
}
