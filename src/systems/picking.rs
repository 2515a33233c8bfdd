//! Cursor hit testing against entity-local bounds.
//!
//! The cursor is given in world space. Each candidate's transform converts it
//! into the entity's local space with
//! [`TransformTree::world_point_to_local`], where it is tested against the
//! entity's [`PickBounds`].

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{trace, warn};

use crate::components::pickbounds::PickBounds;
use crate::components::transformhandle::TransformHandle;
use crate::resources::picking::{CursorPosition, PickHit, PickedEntities};
use crate::resources::transformtree::{TransformError, TransformTree};

/// Test `point` against every candidate and return the hits in input order.
///
/// Entities whose world scale has collapsed to zero cannot be hit.
pub fn pick_entities<'a>(
    tree: &mut TransformTree,
    candidates: impl IntoIterator<Item = (Entity, &'a TransformHandle, &'a PickBounds)>,
    point: Vec2,
) -> Vec<PickHit> {
    let mut hits = Vec::new();
    for (entity, handle, bounds) in candidates {
        match tree.world_point_to_local(handle.id, point) {
            Ok(local_point) if bounds.contains_local(local_point) => {
                hits.push(PickHit {
                    entity,
                    local_point,
                });
            }
            Ok(_) => {}
            Err(TransformError::DegenerateTransform { .. }) => {
                trace!("{} has zero world scale, not pickable", entity);
            }
            Err(e) => warn!("Cannot pick {}: {}", entity, e),
        }
    }
    hits
}

/// Fill [`PickedEntities`] from the current [`CursorPosition`].
pub fn cursor_pick_system(
    cursor: Res<CursorPosition>,
    mut tree: ResMut<TransformTree>,
    candidates: Query<(Entity, &TransformHandle, &PickBounds)>,
    mut picked: ResMut<PickedEntities>,
) {
    picked.hits = match cursor.0 {
        Some(point) => pick_entities(&mut tree, candidates.iter(), point),
        None => Vec::new(),
    };
}
