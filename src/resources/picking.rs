//! Cursor input and hit-test results.
//!
//! [`CursorPosition`] is written by whatever reads the pointer device and is
//! expressed in world space. [`cursor_pick_system`](crate::systems::picking::cursor_pick_system)
//! fills [`PickedEntities`] each frame.

use bevy_ecs::prelude::*;
use glam::Vec2;

/// World-space cursor position, if the cursor is over the scene.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorPosition(pub Option<Vec2>);

/// One entity under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub entity: Entity,
    /// Cursor position in the entity's local space.
    pub local_point: Vec2,
}

/// Entities under the cursor this frame, in query order.
#[derive(Resource, Debug, Clone, Default)]
pub struct PickedEntities {
    pub hits: Vec<PickHit>,
}

impl PickedEntities {
    pub fn contains(&self, entity: Entity) -> bool {
        self.hits.iter().any(|hit| hit.entity == entity)
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
