//! Keeps the transform tree in step with entity lifetimes.
//!
//! A transform is owned by its entity's [`TransformHandle`]. When that
//! component value goes away, whether it is overwritten by a new handle,
//! removed, or despawned with the entity, the node is removed from the
//! [`TransformTree`] and its children are handled by the tree's
//! [`OrphanPolicy`]. Children never keep a handle to a freed parent.

use bevy_ecs::lifecycle::Replace;
use bevy_ecs::prelude::*;
use log::{debug, error, warn};

use crate::components::transformhandle::TransformHandle;
use crate::resources::transformtree::{OrphanPolicy, TransformError, TransformTree};

/// Observer that frees an entity's transform node when its handle is
/// replaced or removed.
///
/// Runs while the outgoing handle is still on the entity, so the old node is
/// released even when a new handle is inserted over it.
///
/// [`OrphanPolicy::Forbid`] cannot veto a despawn that is already happening,
/// so in that case the error is logged and the children are detached to the
/// root instead.
pub fn release_transform_on_replace(
    replace: On<Replace, TransformHandle>,
    handles: Query<&TransformHandle>,
    mut tree: ResMut<TransformTree>,
) {
    let entity = replace.event().entity;
    let Ok(handle) = handles.get(entity) else {
        return;
    };
    let id = handle.id;

    let result = match tree.remove(id) {
        Err(TransformError::HasChildren { count, .. }) => {
            error!(
                "Entity {} lost its transform {} while it still has {} children; detaching them",
                entity, id, count
            );
            tree.remove_with(id, OrphanPolicy::DetachToRoot)
        }
        other => other,
    };

    match result {
        Ok(_) => debug!("Released transform {} of entity {}", id, entity),
        Err(e) => warn!("Could not release transform of entity {}: {}", entity, e),
    }
}
