//! Hierarchical 2D transform tree.
//!
//! [`TransformTree`] is an arena of [`Transform`] nodes addressed by
//! generational [`TransformId`] handles. Each node stores a local
//! [`Pose`] relative to its parent plus lazily refreshed world-space
//! caches:
//!
//! - mutating a local value (or reparenting) marks the node and all of its
//!   descendants dirty;
//! - [`TransformTree::local_to_world`] recomputes the world pose along the
//!   dirty part of the ancestor path, top-down, and clears the flag on every
//!   node it visits;
//! - [`TransformTree::world_to_local`] refreshes forward values first, then
//!   recomputes the inverse only when its own flag is set.
//!
//! Parent/child links are plain handles kept consistent in both directions.
//! Nodes are owned by the tree, not by their parents, so removing a node
//! only needs to decide what happens to its children ([`OrphanPolicy`]).
//!
//! # Example
//!
//! ```
//! use scenetransform::resources::transformtree::TransformTree;
//!
//! let mut tree = TransformTree::new();
//! let root = tree.insert();
//! let child = tree.insert();
//! tree.set_position(root, 10.0, 5.0).unwrap();
//! tree.set_position(child, 2.0, 3.0).unwrap();
//! tree.set_parent(child, Some(root)).unwrap();
//!
//! let world = tree.world_pose(child).unwrap();
//! assert_eq!(world.position.to_array(), [12.0, 8.0]);
//! ```

mod error;
mod node;
mod pose;

pub use error::TransformError;
pub use node::{Transform, TransformId};
pub use pose::{CompositionMode, Pose, rotate};

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::Resource;
use glam::{Mat3, Mat4, Vec2};
use log::{debug, trace};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// What happens to the children of a transform that is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Children move to the removed node's parent (or become roots).
    /// Their local values are kept.
    #[default]
    ReparentToGrandparent,
    /// Children become roots. Their local values are kept.
    DetachToRoot,
    /// Removal of a node with children is refused.
    Forbid,
}

impl OrphanPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            OrphanPolicy::ReparentToGrandparent => "reparent",
            OrphanPolicy::DetachToRoot => "detach",
            OrphanPolicy::Forbid => "forbid",
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reparent" => Ok(OrphanPolicy::ReparentToGrandparent),
            "detach" => Ok(OrphanPolicy::DetachToRoot),
            "forbid" => Ok(OrphanPolicy::Forbid),
            other => Err(format!(
                "Unknown orphan policy '{}', expected 'reparent', 'detach' or 'forbid'",
                other
            )),
        }
    }
}

/// Arena of transforms forming a forest.
///
/// Not internally synchronized: mutate and query from one thread per frame
/// and hand computed matrices to other threads by value (see
/// [`crate::resources::renderbridge`]).
#[derive(Resource, Debug, Default)]
pub struct TransformTree {
    slots: Vec<Option<Transform>>,
    /// Current generation per slot; survives frees.
    generations: Vec<u32>,
    free_list: Vec<u32>,
    mode: CompositionMode,
    orphan_policy: OrphanPolicy,
}

impl TransformTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: CompositionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CompositionMode {
        self.mode
    }

    /// Switch composition semantics. Every cached world value is invalidated.
    pub fn set_mode(&mut self, mode: CompositionMode) {
        if self.mode == mode {
            return;
        }
        debug!("Transform composition mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        for node in self.slots.iter_mut().flatten() {
            node.dirty = true;
            node.inverse_dirty = true;
        }
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    pub fn set_orphan_policy(&mut self, policy: OrphanPolicy) {
        self.orphan_policy = policy;
    }

    // ==================== REGISTRY ====================

    /// Create a root transform with identity local values. It starts clean.
    pub fn insert(&mut self) -> TransformId {
        self.alloc(Transform::default())
    }

    /// Create a root transform with the given local pose.
    pub fn insert_with(&mut self, local: Pose) -> TransformId {
        self.alloc(Transform {
            local,
            dirty: true,
            inverse_dirty: true,
            ..Transform::default()
        })
    }

    fn alloc(&mut self, node: Transform) -> TransformId {
        if let Some(index) = self.free_list.pop() {
            let slot = index as usize;
            self.slots[slot] = Some(node);
            TransformId::new(index, self.generations[slot])
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(node));
            self.generations.push(0);
            TransformId::new(index, 0)
        }
    }

    pub fn contains(&self, id: TransformId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: TransformId) -> Option<&Transform> {
        if self.generations.get(id.slot()) != Some(&id.generation()) {
            return None;
        }
        self.slots.get(id.slot())?.as_ref()
    }

    fn get_mut(&mut self, id: TransformId) -> Option<&mut Transform> {
        if self.generations.get(id.slot()) != Some(&id.generation()) {
            return None;
        }
        self.slots.get_mut(id.slot())?.as_mut()
    }

    fn node(&self, id: TransformId) -> Result<&Transform, TransformError> {
        self.get(id).ok_or(TransformError::Stale(id))
    }

    fn node_mut(&mut self, id: TransformId) -> Result<&mut Transform, TransformError> {
        self.get_mut(id).ok_or(TransformError::Stale(id))
    }

    /// Number of live transforms.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of all live transforms, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = TransformId> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, node)| {
            node.as_ref()
                .map(|_| TransformId::new(slot as u32, self.generations[slot]))
        })
    }

    // ==================== LOCAL VALUES ====================

    pub fn position(&self, id: TransformId) -> Result<Vec2, TransformError> {
        Ok(self.node(id)?.position())
    }

    /// Local rotation in degrees.
    pub fn rotation(&self, id: TransformId) -> Result<f32, TransformError> {
        Ok(self.node(id)?.rotation())
    }

    pub fn scale(&self, id: TransformId) -> Result<Vec2, TransformError> {
        Ok(self.node(id)?.scale())
    }

    pub fn local(&self, id: TransformId) -> Result<Pose, TransformError> {
        Ok(*self.node(id)?.local())
    }

    pub fn set_position(&mut self, id: TransformId, x: f32, y: f32) -> Result<(), TransformError> {
        self.node_mut(id)?.local.position = Vec2::new(x, y);
        self.mark_dirty(id);
        Ok(())
    }

    /// Set local rotation in degrees. The angle is stored as given.
    pub fn set_rotation(&mut self, id: TransformId, degrees: f32) -> Result<(), TransformError> {
        self.node_mut(id)?.local.rotation_degrees = degrees;
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_scale(&mut self, id: TransformId, x: f32, y: f32) -> Result<(), TransformError> {
        self.node_mut(id)?.local.scale = Vec2::new(x, y);
        self.mark_dirty(id);
        Ok(())
    }

    pub fn set_local(&mut self, id: TransformId, local: Pose) -> Result<(), TransformError> {
        self.node_mut(id)?.local = local;
        self.mark_dirty(id);
        Ok(())
    }

    /// Move the local position by `delta`.
    pub fn translate(&mut self, id: TransformId, delta: Vec2) -> Result<(), TransformError> {
        self.node_mut(id)?.local.position += delta;
        self.mark_dirty(id);
        Ok(())
    }

    /// Mark `id` and its whole subtree dirty.
    ///
    /// Stops descending at nodes already dirty: their subtrees were marked
    /// when they became dirty.
    fn mark_dirty(&mut self, id: TransformId) {
        let mut stack: SmallVec<[TransformId; 16]> = smallvec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get_mut(current) else {
                continue;
            };
            if node.dirty {
                continue;
            }
            node.dirty = true;
            node.inverse_dirty = true;
            stack.extend(node.children.iter().copied());
        }
    }

    // ==================== HIERARCHY ====================

    pub fn parent(&self, id: TransformId) -> Result<Option<TransformId>, TransformError> {
        Ok(self.node(id)?.parent())
    }

    pub fn children(&self, id: TransformId) -> Result<&[TransformId], TransformError> {
        Ok(self.node(id)?.children())
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: TransformId, id: TransformId) -> bool {
        let mut cursor = self.get(id).and_then(Transform::parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(Transform::parent);
        }
        false
    }

    fn check_reparent(
        &self,
        id: TransformId,
        parent: Option<TransformId>,
    ) -> Result<(), TransformError> {
        self.node(id)?;
        let Some(parent) = parent else {
            return Ok(());
        };
        self.node(parent)?;
        if parent == id || self.is_ancestor(id, parent) {
            debug!("Rejected reparenting {} under {}: would create a cycle", id, parent);
            return Err(TransformError::CycleRejected { child: id, parent });
        }
        Ok(())
    }

    /// Reparent `id` under `parent`, or make it a root with `None`.
    ///
    /// Local values are kept, so the world pose generally changes. Rejected
    /// with [`TransformError::CycleRejected`] if `parent` is `id` itself or
    /// one of its descendants; the tree is then left untouched.
    pub fn set_parent(
        &mut self,
        id: TransformId,
        parent: Option<TransformId>,
    ) -> Result<(), TransformError> {
        self.check_reparent(id, parent)?;
        let old_parent = self.node(id)?.parent;
        if old_parent == parent {
            return Ok(());
        }

        if let Some(old) = old_parent
            && let Some(old_node) = self.get_mut(old)
        {
            old_node.children.retain(|child| *child != id);
        }
        if let Some(new) = parent
            && let Some(new_node) = self.get_mut(new)
        {
            new_node.children.push(id);
        }
        self.node_mut(id)?.parent = parent;

        debug_assert!(old_parent.is_none_or(|p| self.check_transform_structure(p)));
        debug_assert!(parent.is_none_or(|p| self.check_transform_structure(p)));

        self.mark_dirty(id);
        Ok(())
    }

    /// Reparent `id` and rewrite its local pose so its world pose is unchanged.
    ///
    /// Fails with [`TransformError::DegenerateTransform`] if the new parent's
    /// world scale has a zero component. Nothing changes on failure.
    pub fn set_parent_keep_world(
        &mut self,
        id: TransformId,
        parent: Option<TransformId>,
    ) -> Result<(), TransformError> {
        self.check_reparent(id, parent)?;
        let world = self.world_pose(id)?;
        let local = match parent {
            Some(parent) => {
                let parent_world = self.world_pose(parent)?;
                self.mode.decompose(&parent_world, &world).ok_or(
                    TransformError::DegenerateTransform {
                        id: parent,
                        scale: parent_world.scale,
                    },
                )?
            }
            None => world,
        };
        self.set_parent(id, parent)?;
        self.set_local(id, local)
    }

    // ==================== WORLD SPACE ====================

    /// Recompute world values for `id` if it is dirty.
    ///
    /// A clean node only has clean ancestors, so the walk upwards stops at
    /// the first clean one and composition restarts from its cached pose.
    fn refresh(&mut self, id: TransformId) -> Result<(), TransformError> {
        if !self.node(id)?.dirty {
            return Ok(());
        }

        let mut path: SmallVec<[TransformId; 16]> = SmallVec::new();
        let mut base: Option<Pose> = None;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if !node.dirty {
                base = Some(node.world);
                break;
            }
            path.push(current);
            cursor = node.parent;
        }

        let mode = self.mode;
        let mut parent_world = base;
        for current in path.iter().rev() {
            let node = self.node_mut(*current)?;
            let world = match parent_world {
                Some(parent) => mode.compose(&parent, &node.local),
                None => node.local,
            };
            node.world = world;
            node.local_to_world = world.to_mat4();
            node.dirty = false;
            parent_world = Some(world);
        }
        trace!("Refreshed {} transform(s) up to {}", path.len(), id);
        Ok(())
    }

    /// World pose of `id`, refreshing caches as needed.
    pub fn world_pose(&mut self, id: TransformId) -> Result<Pose, TransformError> {
        self.refresh(id)?;
        Ok(self.node(id)?.world)
    }

    /// Column-major model matrix mapping local space of `id` to world space.
    pub fn local_to_world(&mut self, id: TransformId) -> Result<Mat4, TransformError> {
        self.refresh(id)?;
        Ok(self.node(id)?.local_to_world)
    }

    /// Inverse of the world transform of `id` as a 2D homogeneous matrix.
    ///
    /// Fails with [`TransformError::DegenerateTransform`] when the world
    /// scale has a zero component; the inverse then stays flagged stale.
    pub fn world_to_local(&mut self, id: TransformId) -> Result<Mat3, TransformError> {
        self.refresh(id)?;
        let node = self.node_mut(id)?;
        if node.inverse_dirty {
            let inverse = node
                .world
                .inverse_mat3()
                .ok_or(TransformError::DegenerateTransform {
                    id,
                    scale: node.world.scale,
                })?;
            node.world_to_local = inverse;
            node.inverse_dirty = false;
        }
        Ok(node.world_to_local)
    }

    /// Convert a world-space point into the local space of `id`.
    pub fn world_point_to_local(
        &mut self,
        id: TransformId,
        point: Vec2,
    ) -> Result<Vec2, TransformError> {
        Ok(self.world_to_local(id)?.transform_point2(point))
    }

    // ==================== REMOVAL ====================

    /// Remove `id` using the tree's [`OrphanPolicy`].
    pub fn remove(&mut self, id: TransformId) -> Result<Transform, TransformError> {
        self.remove_with(id, self.orphan_policy)
    }

    /// Remove `id`, handling its children according to `policy`.
    ///
    /// The slot is freed and its generation bumped, so `id` and any copies
    /// of it become stale.
    pub fn remove_with(
        &mut self,
        id: TransformId,
        policy: OrphanPolicy,
    ) -> Result<Transform, TransformError> {
        let node = self.node(id)?;
        let children = node.children.clone();
        let grandparent = node.parent;

        let new_parent = match policy {
            OrphanPolicy::Forbid if !children.is_empty() => {
                return Err(TransformError::HasChildren {
                    id,
                    count: children.len(),
                });
            }
            OrphanPolicy::ReparentToGrandparent => grandparent,
            OrphanPolicy::DetachToRoot | OrphanPolicy::Forbid => None,
        };
        for child in children.iter() {
            self.set_parent(*child, new_parent)?;
        }
        self.set_parent(id, None)?;

        let slot = id.slot();
        let removed = self.slots[slot].take().ok_or(TransformError::Stale(id))?;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push(id.index());
        debug!(
            "Removed {} ({} orphan(s), policy {})",
            id,
            children.len(),
            policy
        );
        Ok(removed)
    }

    // ==================== DIAGNOSTICS ====================

    /// True if every child listed under `id` points back to `id`.
    ///
    /// Diagnostic helper for tests and debug assertions.
    pub fn check_transform_structure(&self, id: TransformId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        node.children
            .iter()
            .all(|child| self.get(*child).is_some_and(|c| c.parent == Some(id)))
    }

    /// Check bidirectional links and acyclicity for the whole arena.
    pub fn validate(&self) -> Result<(), TransformError> {
        for id in self.ids() {
            let node = self.node(id)?;
            for child in node.children.iter() {
                if self.get(*child).is_none_or(|c| c.parent != Some(id)) {
                    return Err(TransformError::StructuralInconsistency {
                        parent: id,
                        child: *child,
                    });
                }
            }
            if let Some(parent) = node.parent
                && self.get(parent).is_none_or(|p| !p.children.contains(&id))
            {
                return Err(TransformError::StructuralInconsistency { parent, child: id });
            }

            let mut seen: FxHashSet<TransformId> = FxHashSet::default();
            seen.insert(id);
            let mut cursor = id;
            while let Some(parent) = self.get(cursor).and_then(Transform::parent) {
                if !seen.insert(parent) {
                    return Err(TransformError::StructuralInconsistency {
                        parent,
                        child: cursor,
                    });
                }
                cursor = parent;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_v2(a: Vec2, x: f32, y: f32) -> bool {
        approx_eq(a.x, x) && approx_eq(a.y, y)
    }

    /// root (10, 5) <- child (2, 3) <- grandchild (1, 1)
    fn chain(tree: &mut TransformTree) -> (TransformId, TransformId, TransformId) {
        let root = tree.insert();
        let child = tree.insert();
        let grandchild = tree.insert();
        tree.set_position(root, 10.0, 5.0).unwrap();
        tree.set_position(child, 2.0, 3.0).unwrap();
        tree.set_position(grandchild, 1.0, 1.0).unwrap();
        tree.set_parent(child, Some(root)).unwrap();
        tree.set_parent(grandchild, Some(child)).unwrap();
        (root, child, grandchild)
    }

    #[test]
    fn test_new_transform_is_identity_root_and_clean() {
        let mut tree = TransformTree::new();
        let id = tree.insert();
        let node = tree.get(id).unwrap();
        assert!(approx_v2(node.position(), 0.0, 0.0));
        assert!(approx_v2(node.scale(), 1.0, 1.0));
        assert!(approx_eq(node.rotation(), 0.0));
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
        assert!(!node.is_dirty());
        assert!(!node.is_inverse_dirty());
        assert_eq!(tree.local_to_world(id).unwrap(), Mat4::IDENTITY);
    }

    #[test]
    fn test_setters_overwrite_local_values() {
        let mut tree = TransformTree::new();
        let id = tree.insert();
        tree.set_position(id, 3.0, -4.0).unwrap();
        tree.set_scale(id, 2.0, 0.5).unwrap();
        tree.set_rotation(id, 725.0).unwrap();
        assert!(approx_v2(tree.position(id).unwrap(), 3.0, -4.0));
        assert!(approx_v2(tree.scale(id).unwrap(), 2.0, 0.5));
        // No wraparound
        assert!(approx_eq(tree.rotation(id).unwrap(), 725.0));
    }

    #[test]
    fn test_setter_cascades_dirty_to_descendants() {
        let mut tree = TransformTree::new();
        let (root, child, grandchild) = chain(&mut tree);
        tree.local_to_world(grandchild).unwrap();
        for id in [root, child, grandchild] {
            assert!(!tree.get(id).unwrap().is_dirty());
        }

        tree.set_rotation(root, 15.0).unwrap();
        for id in [root, child, grandchild] {
            let node = tree.get(id).unwrap();
            assert!(node.is_dirty(), "{} should be dirty", id);
            assert!(node.is_inverse_dirty(), "{} should be inverse-dirty", id);
        }
    }

    #[test]
    fn test_refresh_clears_path_but_not_siblings() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let left = tree.insert();
        let right = tree.insert();
        tree.set_parent(left, Some(root)).unwrap();
        tree.set_parent(right, Some(root)).unwrap();

        tree.local_to_world(left).unwrap();
        assert!(!tree.get(root).unwrap().is_dirty());
        assert!(!tree.get(left).unwrap().is_dirty());
        assert!(tree.get(right).unwrap().is_dirty());
        // Forward refresh leaves the inverse stale.
        assert!(tree.get(left).unwrap().is_inverse_dirty());
    }

    #[test]
    fn test_dirty_propagation_reaches_grandchild() {
        let mut tree = TransformTree::new();
        let (root, _, grandchild) = chain(&mut tree);
        assert!(approx_v2(tree.world_pose(grandchild).unwrap().position, 13.0, 9.0));

        tree.set_position(root, -10.0, 0.0).unwrap();
        let m = tree.local_to_world(grandchild).unwrap();
        assert!(approx_eq(m.w_axis.x, -7.0), "got {}", m.w_axis.x);
        assert!(approx_eq(m.w_axis.y, 4.0), "got {}", m.w_axis.y);
    }

    #[test]
    fn test_local_to_world_is_idempotent() {
        let mut tree = TransformTree::new();
        let (_, _, grandchild) = chain(&mut tree);
        let first = tree.local_to_world(grandchild).unwrap();
        let second = tree.local_to_world(grandchild).unwrap();
        assert_eq!(first, second);
        let pose_a = tree.world_pose(grandchild).unwrap();
        let pose_b = tree.world_pose(grandchild).unwrap();
        assert_eq!(pose_a, pose_b);
    }

    #[test]
    fn test_identity_composition() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let child = tree.insert();
        tree.set_parent(child, Some(root)).unwrap();
        let world = tree.world_pose(child).unwrap();
        assert!(approx_v2(world.position, 0.0, 0.0));
        assert!(approx_v2(world.scale, 1.0, 1.0));
        assert!(approx_eq(world.rotation_degrees, 0.0));
    }

    #[test]
    fn test_translation_composition_in_both_modes() {
        for mode in [CompositionMode::Legacy, CompositionMode::Affine] {
            let mut tree = TransformTree::with_mode(mode);
            let root = tree.insert();
            let child = tree.insert();
            tree.set_position(root, 10.0, 5.0).unwrap();
            tree.set_position(child, 2.0, 3.0).unwrap();
            tree.set_parent(child, Some(root)).unwrap();
            let world = tree.world_pose(child).unwrap();
            assert!(approx_v2(world.position, 12.0, 8.0), "{}: {:?}", mode, world);
        }
    }

    #[test]
    fn test_scale_composition_is_product() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let child = tree.insert();
        tree.set_scale(root, 2.0, 2.0).unwrap();
        tree.set_scale(child, 3.0, 3.0).unwrap();
        tree.set_parent(child, Some(root)).unwrap();
        assert!(approx_v2(tree.world_pose(child).unwrap().scale, 6.0, 6.0));
    }

    #[test]
    fn test_rotation_composition_sums_without_wrapping() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let child = tree.insert();
        tree.set_rotation(root, 350.0).unwrap();
        tree.set_rotation(child, 20.0).unwrap();
        tree.set_parent(child, Some(root)).unwrap();
        assert!(approx_eq(tree.world_pose(child).unwrap().rotation_degrees, 370.0));
    }

    #[test]
    fn test_legacy_mode_parent_rotation_does_not_move_child() {
        let mut tree = TransformTree::with_mode(CompositionMode::Legacy);
        let root = tree.insert();
        let child = tree.insert();
        tree.set_position(root, 100.0, 100.0).unwrap();
        tree.set_rotation(root, 90.0).unwrap();
        tree.set_scale(root, 2.0, 2.0).unwrap();
        tree.set_position(child, 40.0, 0.0).unwrap();
        tree.set_parent(child, Some(root)).unwrap();
        assert!(approx_v2(tree.world_pose(child).unwrap().position, 140.0, 100.0));
    }

    #[test]
    fn test_affine_mode_parent_rotation_revolves_child() {
        let mut tree = TransformTree::with_mode(CompositionMode::Affine);
        let root = tree.insert();
        let child = tree.insert();
        tree.set_position(root, 100.0, 100.0).unwrap();
        tree.set_rotation(root, 90.0).unwrap();
        tree.set_scale(root, 2.0, 2.0).unwrap();
        tree.set_position(child, 40.0, 0.0).unwrap();
        tree.set_parent(child, Some(root)).unwrap();
        assert!(approx_v2(tree.world_pose(child).unwrap().position, 100.0, 180.0));
    }

    #[test]
    fn test_set_mode_invalidates_caches() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let child = tree.insert();
        tree.set_rotation(root, 90.0).unwrap();
        tree.set_position(child, 10.0, 0.0).unwrap();
        tree.set_parent(child, Some(root)).unwrap();
        assert!(approx_v2(tree.world_pose(child).unwrap().position, 10.0, 0.0));

        tree.set_mode(CompositionMode::Affine);
        assert!(tree.get(child).unwrap().is_dirty());
        assert!(approx_v2(tree.world_pose(child).unwrap().position, 0.0, 10.0));
    }

    #[test]
    fn test_reparent_cycle_is_rejected_and_tree_unchanged() {
        let mut tree = TransformTree::new();
        let a = tree.insert();
        let b = tree.insert();
        tree.set_parent(b, Some(a)).unwrap();

        let err = tree.set_parent(a, Some(b)).unwrap_err();
        assert_eq!(err, TransformError::CycleRejected { child: a, parent: b });
        assert_eq!(tree.parent(a).unwrap(), None);
        assert_eq!(tree.parent(b).unwrap(), Some(a));
        assert_eq!(tree.children(a).unwrap(), &[b]);
        assert!(tree.children(b).unwrap().is_empty());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_reparent_to_self_or_deep_descendant_is_rejected() {
        let mut tree = TransformTree::new();
        let (root, _, grandchild) = chain(&mut tree);
        assert!(matches!(
            tree.set_parent(root, Some(root)),
            Err(TransformError::CycleRejected { .. })
        ));
        assert!(matches!(
            tree.set_parent(root, Some(grandchild)),
            Err(TransformError::CycleRejected { .. })
        ));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_reparent_moves_child_between_parents() {
        let mut tree = TransformTree::new();
        let first = tree.insert();
        let second = tree.insert();
        let child = tree.insert();
        tree.set_parent(child, Some(first)).unwrap();
        tree.set_parent(child, Some(second)).unwrap();

        assert!(tree.children(first).unwrap().is_empty());
        assert_eq!(tree.children(second).unwrap(), &[child]);
        assert!(tree.check_transform_structure(first));
        assert!(tree.check_transform_structure(second));

        tree.set_parent(child, None).unwrap();
        assert!(tree.children(second).unwrap().is_empty());
        assert_eq!(tree.parent(child).unwrap(), None);
    }

    #[test]
    fn test_reparent_to_same_parent_keeps_child_order() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let a = tree.insert();
        let b = tree.insert();
        tree.set_parent(a, Some(root)).unwrap();
        tree.set_parent(b, Some(root)).unwrap();
        tree.set_parent(a, Some(root)).unwrap();
        assert_eq!(tree.children(root).unwrap(), &[a, b]);
    }

    #[test]
    fn test_set_parent_keep_world_preserves_world_pose() {
        for mode in [CompositionMode::Legacy, CompositionMode::Affine] {
            let mut tree = TransformTree::with_mode(mode);
            let parent = tree.insert_with(
                Pose::from_position(100.0, 100.0)
                    .with_rotation(90.0)
                    .with_scale(2.0, 2.0),
            );
            let child = tree.insert_with(Pose::from_position(40.0, 0.0).with_rotation(10.0));
            let before = tree.world_pose(child).unwrap();

            tree.set_parent_keep_world(child, Some(parent)).unwrap();
            let after = tree.world_pose(child).unwrap();
            assert!(approx_v2(after.position, before.position.x, before.position.y), "{}", mode);
            assert!(approx_eq(after.rotation_degrees, before.rotation_degrees));
            assert!(approx_v2(after.scale, before.scale.x, before.scale.y));

            tree.set_parent_keep_world(child, None).unwrap();
            let root_local = tree.local(child).unwrap();
            assert!(approx_v2(root_local.position, before.position.x, before.position.y));
        }
    }

    #[test]
    fn test_set_parent_keep_world_rejects_degenerate_parent() {
        let mut tree = TransformTree::new();
        let parent = tree.insert_with(Pose::IDENTITY.with_scale(0.0, 1.0));
        let child = tree.insert();
        let err = tree.set_parent_keep_world(child, Some(parent)).unwrap_err();
        assert!(matches!(err, TransformError::DegenerateTransform { id, .. } if id == parent));
        assert_eq!(tree.parent(child).unwrap(), None);
    }

    #[test]
    fn test_world_to_local_inverts_local_to_world() {
        let mut tree = TransformTree::with_mode(CompositionMode::Affine);
        let root = tree.insert_with(Pose::from_position(5.0, 5.0).with_rotation(30.0));
        let child = tree.insert_with(Pose::from_position(3.0, 1.0).with_scale(2.0, 4.0));
        tree.set_parent(child, Some(root)).unwrap();

        let local_point = Vec2::new(0.25, -1.5);
        let world_point = tree
            .local_to_world(child)
            .unwrap()
            .transform_point3(local_point.extend(0.0));
        let back = tree.world_point_to_local(child, world_point.truncate()).unwrap();
        assert!(approx_v2(back, local_point.x, local_point.y), "{:?}", back);
    }

    #[test]
    fn test_world_to_local_forces_forward_refresh() {
        let mut tree = TransformTree::new();
        let (root, _, grandchild) = chain(&mut tree);
        tree.set_position(root, 0.0, 0.0).unwrap();
        assert!(tree.get(grandchild).unwrap().is_dirty());

        let inverse = tree.world_to_local(grandchild).unwrap();
        let node = tree.get(grandchild).unwrap();
        assert!(!node.is_dirty());
        assert!(!node.is_inverse_dirty());
        // grandchild world position is (3, 4)
        let origin = inverse.transform_point2(Vec2::new(3.0, 4.0));
        assert!(approx_v2(origin, 0.0, 0.0), "{:?}", origin);
    }

    #[test]
    fn test_world_to_local_recomputes_only_when_inverse_dirty() {
        let mut tree = TransformTree::new();
        let id = tree.insert_with(Pose::from_position(1.0, 2.0));
        let first = tree.world_to_local(id).unwrap();
        assert!(!tree.get(id).unwrap().is_inverse_dirty());
        assert_eq!(tree.world_to_local(id).unwrap(), first);

        tree.set_position(id, 4.0, 2.0).unwrap();
        assert!(tree.get(id).unwrap().is_inverse_dirty());
        let moved = tree.world_to_local(id).unwrap();
        assert!(approx_v2(moved.transform_point2(Vec2::new(4.0, 2.0)), 0.0, 0.0));
    }

    #[test]
    fn test_degenerate_inverse_reported_for_descendant() {
        let mut tree = TransformTree::new();
        let (root, child, grandchild) = chain(&mut tree);
        tree.set_scale(root, 0.0, 1.0).unwrap();

        for id in [root, child, grandchild] {
            let err = tree.world_to_local(id).unwrap_err();
            match err {
                TransformError::DegenerateTransform { id: bad, scale } => {
                    assert_eq!(bad, id);
                    assert!(approx_eq(scale.x, 0.0));
                }
                other => panic!("Expected DegenerateTransform, got {:?}", other),
            }
            assert!(tree.get(id).unwrap().is_inverse_dirty());
        }
        // Forward direction stays available.
        assert!(tree.local_to_world(grandchild).unwrap().is_finite());
    }

    #[test]
    fn test_remove_reparents_children_to_grandparent() {
        let mut tree = TransformTree::new();
        let (root, child, grandchild) = chain(&mut tree);
        tree.set_orphan_policy(OrphanPolicy::ReparentToGrandparent);

        tree.remove(child).unwrap();
        assert!(!tree.contains(child));
        assert_eq!(tree.parent(grandchild).unwrap(), Some(root));
        assert_eq!(tree.children(root).unwrap(), &[grandchild]);
        // Local (1, 1) now composes directly with root (10, 5).
        assert!(approx_v2(tree.world_pose(grandchild).unwrap().position, 11.0, 6.0));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_remove_detaches_children_to_root() {
        let mut tree = TransformTree::new();
        let (root, child, grandchild) = chain(&mut tree);

        tree.remove_with(child, OrphanPolicy::DetachToRoot).unwrap();
        assert_eq!(tree.parent(grandchild).unwrap(), None);
        assert!(tree.children(root).unwrap().is_empty());
        assert!(approx_v2(tree.world_pose(grandchild).unwrap().position, 1.0, 1.0));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_remove_forbidden_with_live_children() {
        let mut tree = TransformTree::new();
        let (_, child, grandchild) = chain(&mut tree);
        tree.set_orphan_policy(OrphanPolicy::Forbid);

        let err = tree.remove(child).unwrap_err();
        assert_eq!(err, TransformError::HasChildren { id: child, count: 1 });
        assert!(tree.contains(child));
        assert_eq!(tree.parent(grandchild).unwrap(), Some(child));

        // Leaves are fine under Forbid.
        tree.remove(grandchild).unwrap();
        assert!(tree.children(child).unwrap().is_empty());
    }

    #[test]
    fn test_removed_handle_is_stale_after_slot_reuse() {
        let mut tree = TransformTree::new();
        let old = tree.insert();
        tree.remove(old).unwrap();
        let new = tree.insert();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert_eq!(tree.position(old), Err(TransformError::Stale(old)));
        assert_eq!(tree.set_parent(new, Some(old)), Err(TransformError::Stale(old)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_validate_detects_broken_back_reference() {
        let mut tree = TransformTree::new();
        let (root, child, _) = chain(&mut tree);
        tree.get_mut(child).unwrap().parent = None;
        assert!(!tree.check_transform_structure(root));
        assert_eq!(
            tree.validate(),
            Err(TransformError::StructuralInconsistency { parent: root, child })
        );
    }

    #[test]
    fn test_deep_chain_does_not_overflow_stack() {
        let mut tree = TransformTree::new();
        let root = tree.insert();
        let mut last = root;
        for _ in 0..5_000 {
            let next = tree.insert_with(Pose::from_position(1.0, 0.0));
            tree.set_parent(next, Some(last)).unwrap();
            last = next;
        }
        assert!(approx_eq(tree.world_pose(last).unwrap().position.x, 5_000.0));
        tree.set_position(root, 5.0, 0.0).unwrap();
        assert!(tree.get(last).unwrap().is_dirty());
        assert!(approx_eq(tree.world_pose(last).unwrap().position.x, 5_005.0));
    }
}
