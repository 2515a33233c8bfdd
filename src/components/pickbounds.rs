//! Local-space rectangle used for cursor hit testing.
//!
//! Bounds are expressed in the entity's own local space, centered on its
//! origin. A world-space point is first converted with
//! [`TransformTree::world_point_to_local`](crate::resources::transformtree::TransformTree::world_point_to_local)
//! and then tested here, so rotation and scale of the entity and all its
//! ancestors are accounted for.

use bevy_ecs::prelude::Component;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct PickBounds {
    pub half_size: Vec2,
    pub offset: Vec2,
}

impl PickBounds {
    /// Bounds of the given full width and height, centered on the origin.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            half_size: Vec2::new(width, height) * 0.5,
            offset: Vec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Point containment in local space. Edges count as inside.
    pub fn contains_local(&self, point: Vec2) -> bool {
        let d = (point - self.offset).abs();
        let half = self.half_size.abs();
        d.x <= half.x && d.y <= half.y
    }
}
