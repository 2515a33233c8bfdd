//! Local/world poses and the rules used to compose them.
//!
//! A [`Pose`] is the position, rotation (degrees) and scale of one node,
//! either relative to its parent (local) or in the global frame (world).
//! [`CompositionMode`] decides how a parent's world pose and a child's local
//! pose combine into the child's world pose.
//!
//! # Composition modes
//!
//! - [`CompositionMode::Legacy`] sums positions, multiplies scales and sums
//!   rotations down the ancestor chain. A rotated or scaled parent does not
//!   move its children: they translate as if parent rotation and scale did
//!   not affect position.
//! - [`CompositionMode::Affine`] scales the child's local offset by the
//!   parent's world scale and rotates it by the parent's world rotation
//!   before adding it, so children revolve around a rotating parent.
//!
//! Legacy is the default. Switch with
//! [`TransformTree::set_mode`](super::TransformTree::set_mode) or the
//! `[transform] composition` config key.

use std::fmt;
use std::str::FromStr;

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Rotate a 2D vector by `angle_degrees`.
pub fn rotate(v: Vec2, angle_degrees: f32) -> Vec2 {
    Vec2::from_angle(angle_degrees.to_radians()).rotate(v)
}

/// Position, rotation and scale of a node in some frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Rotation in degrees. Never wrapped to `[0, 360)`.
    pub rotation_degrees: f32,
    pub scale: Vec2,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation_degrees: 0.0,
        scale: Vec2::ONE,
    };

    pub fn new(position: Vec2, rotation_degrees: f32, scale: Vec2) -> Self {
        Self {
            position,
            rotation_degrees,
            scale,
        }
    }

    pub fn from_position(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vec2::new(x, y);
        self
    }

    /// Model matrix `T * R * S`, lifted to 3D with z = 0.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation_degrees.to_radians()),
            Vec3::new(self.position.x, self.position.y, 0.0),
        )
    }

    /// 2D homogeneous form of [`Pose::to_mat4`].
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(
            self.scale,
            self.rotation_degrees.to_radians(),
            self.position,
        )
    }

    /// Inverse of [`Pose::to_mat3`]: `S^-1 * R^-1 * T^-1`.
    ///
    /// Returns `None` when a scale component is zero or the result is not
    /// finite.
    pub fn inverse_mat3(&self) -> Option<Mat3> {
        if self.scale.x == 0.0 || self.scale.y == 0.0 {
            return None;
        }
        let inverse = Mat3::from_scale(self.scale.recip())
            * Mat3::from_angle(-self.rotation_degrees.to_radians())
            * Mat3::from_translation(-self.position);
        inverse.is_finite().then_some(inverse)
    }
}

/// How a child's local pose combines with its parent's world pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    /// Sum of positions, product of scales, sum of rotations.
    #[default]
    Legacy,
    /// Rotation- and scale-aware 2D affine composition.
    Affine,
}

impl CompositionMode {
    /// World pose of a child whose parent has world pose `parent`.
    pub fn compose(self, parent: &Pose, local: &Pose) -> Pose {
        let offset = match self {
            CompositionMode::Legacy => local.position,
            CompositionMode::Affine => {
                rotate(local.position * parent.scale, parent.rotation_degrees)
            }
        };
        Pose {
            position: parent.position + offset,
            rotation_degrees: parent.rotation_degrees + local.rotation_degrees,
            scale: parent.scale * local.scale,
        }
    }

    /// Local pose that, composed under `parent`, yields `world`.
    ///
    /// `None` if the parent's world scale has a zero component.
    pub fn decompose(self, parent: &Pose, world: &Pose) -> Option<Pose> {
        if parent.scale.x == 0.0 || parent.scale.y == 0.0 {
            return None;
        }
        let delta = world.position - parent.position;
        let position = match self {
            CompositionMode::Legacy => delta,
            CompositionMode::Affine => rotate(delta, -parent.rotation_degrees) / parent.scale,
        };
        let local = Pose {
            position,
            rotation_degrees: world.rotation_degrees - parent.rotation_degrees,
            scale: world.scale / parent.scale,
        };
        (local.position.is_finite() && local.scale.is_finite()).then_some(local)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompositionMode::Legacy => "legacy",
            CompositionMode::Affine => "affine",
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(CompositionMode::Legacy),
            "affine" => Ok(CompositionMode::Affine),
            other => Err(format!(
                "Unknown composition mode '{}', expected 'legacy' or 'affine'",
                other
            )),
        }
    }
}
