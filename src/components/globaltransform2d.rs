//! Computed world-space transform for entities in a hierarchy.
//!
//! The [`propagate_transforms`](crate::systems::propagate_transforms::propagate_transforms)
//! system copies each entity's world pose out of the
//! [`TransformTree`](crate::resources::transformtree::TransformTree) into this
//! component, so gameplay and collision code can read it through plain
//! queries without touching the tree.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::Serialize;

use crate::resources::transformtree::Pose;

/// World-space snapshot of an entity's transform.
///
/// Refreshed once per frame. For root entities it equals the local values.
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GlobalTransform2D {
    /// World-space position.
    pub position: Vec2,
    /// World-space rotation in degrees.
    pub rotation_degrees: f32,
    /// World-space scale.
    pub scale: Vec2,
}

impl Default for GlobalTransform2D {
    fn default() -> Self {
        Self::from(Pose::IDENTITY)
    }
}

impl From<Pose> for GlobalTransform2D {
    fn from(pose: Pose) -> Self {
        Self {
            position: pose.position,
            rotation_degrees: pose.rotation_degrees,
            scale: pose.scale,
        }
    }
}
