//! Arena node and handle types.

use std::fmt;

use glam::{Mat3, Mat4, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::pose::Pose;

/// Generational handle to a [`Transform`] stored in a
/// [`TransformTree`](super::TransformTree).
///
/// Handles do not own the node. Once the node is removed its slot may be
/// reused with a bumped generation, and old handles stop resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransformId {
    index: u32,
    generation: u32,
}

impl TransformId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}v{}", self.index, self.generation)
    }
}

/// One node of the hierarchy.
///
/// Local values are set through the tree; world values and both matrices
/// are caches owned by the tree's refresh logic.
#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) parent: Option<TransformId>,
    pub(crate) children: SmallVec<[TransformId; 4]>,
    pub(crate) local: Pose,
    pub(crate) world: Pose,
    /// World pose and `local_to_world` are stale.
    pub(crate) dirty: bool,
    /// `world_to_local` is stale.
    pub(crate) inverse_dirty: bool,
    pub(crate) local_to_world: Mat4,
    pub(crate) world_to_local: Mat3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            local: Pose::IDENTITY,
            world: Pose::IDENTITY,
            dirty: false,
            inverse_dirty: false,
            local_to_world: Mat4::IDENTITY,
            world_to_local: Mat3::IDENTITY,
        }
    }
}

impl Transform {
    pub fn position(&self) -> Vec2 {
        self.local.position
    }

    pub fn rotation(&self) -> f32 {
        self.local.rotation_degrees
    }

    pub fn scale(&self) -> Vec2 {
        self.local.scale
    }

    pub fn local(&self) -> &Pose {
        &self.local
    }

    pub fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    pub fn children(&self) -> &[TransformId] {
        &self.children
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_inverse_dirty(&self) -> bool {
        self.inverse_dirty
    }

    /// Last computed world pose. Only meaningful while `!is_dirty()`.
    pub fn cached_world(&self) -> &Pose {
        &self.world
    }
}
