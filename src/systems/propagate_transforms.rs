//! World-space snapshot of every entity's transform.
//!
//! Copies each [`TransformHandle`] entity's world pose out of the
//! [`TransformTree`] into its [`GlobalTransform2D`].
//!
//! # Schedule position
//!
//! Should run **after** all systems that mutate local transforms (movement,
//! reparenting) and **before** picking and rendering so that downstream
//! systems see up-to-date world positions.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::transformhandle::TransformHandle;
use crate::resources::transformtree::TransformTree;

/// Refresh and publish world transforms.
///
/// The tree only recomputes nodes that are dirty, so untouched subtrees
/// cost a flag check each. Entities that already have a `GlobalTransform2D`
/// are updated in place (only when the value changed, to keep change
/// detection meaningful). Entities missing the component get it inserted via
/// deferred [`Commands`] (visible after the schedule applies them).
pub fn propagate_transforms(
    mut tree: ResMut<TransformTree>,
    mut query: Query<(Entity, &TransformHandle, Option<&mut GlobalTransform2D>)>,
    mut commands: Commands,
) {
    for (entity, handle, maybe_global) in query.iter_mut() {
        let pose = match tree.world_pose(handle.id) {
            Ok(pose) => pose,
            Err(e) => {
                warn!("Cannot compute world transform of {}: {}", entity, e);
                continue;
            }
        };
        let global = GlobalTransform2D::from(pose);
        match maybe_global {
            Some(mut current) => {
                if *current != global {
                    *current = global;
                }
            }
            None => {
                commands.entity(entity).insert(global);
            }
        }
    }
}
