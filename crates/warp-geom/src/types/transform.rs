// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::{Quat, Vec3};

/// Rotation followed by translation. No scale.
///
/// Narrow-phase routines operate on shapes whose scale and stretch have
/// already been baked in, so this is the transform they consume.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidTransform {
    rotation: Quat,
    position: Vec3,
}

impl RigidTransform {
    /// Identity transform.
    pub const fn identity() -> Self {
        Self {
            rotation: Quat::identity(),
            position: Vec3::ZERO,
        }
    }

    /// Creates a transform from a rotation and a position.
    pub const fn new(rotation: Quat, position: Vec3) -> Self {
        Self { rotation, position }
    }

    /// Pure translation.
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(Quat::identity(), position)
    }

    /// Rotation component.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Translation component.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Maps a local-space point into world space.
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.rotation.rotate(point) + self.position
    }

    /// Maps a local-space direction into world space (ignores translation).
    pub fn transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.rotation.rotate(direction)
    }

    /// Maps a world-space point into local space.
    pub fn inverse_transform_point(&self, point: &Vec3) -> Vec3 {
        self.rotation.inverse_rotate(&(*point - self.position))
    }

    /// Maps a world-space direction into local space.
    pub fn inverse_transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.rotation.inverse_rotate(direction)
    }

    /// Composition `self * local`: applies `local` first, then `self`.
    pub fn multiply(&self, local: &Self) -> Self {
        Self {
            rotation: self.rotation.multiply(&local.rotation).normalize(),
            position: self.transform_point(&local.position),
        }
    }

    /// Inverse transform.
    pub fn inverse(&self) -> Self {
        let inv = self.rotation.conjugate();
        Self {
            rotation: inv,
            position: inv.rotate(&-self.position),
        }
    }

    /// Expresses `other` in this transform's local frame (`self⁻¹ * other`).
    pub fn inverse_multiply(&self, other: &Self) -> Self {
        self.inverse().multiply(other)
    }
}

/// World transform of a body: position, rotation, uniform scale, and stretch.
///
/// Conventions:
/// - `scale` is a uniform factor; `stretch` is a per-axis factor applied in
///   the shape's local frame before rotation. How stretch distributes over a
///   shape's parameters is decided by the shape's stretch policy.
/// - Identity is `scale = 1`, `stretch = (1, 1, 1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformQvvs {
    position: Vec3,
    rotation: Quat,
    scale: f32,
    stretch: Vec3,
}

impl Default for TransformQvvs {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformQvvs {
    /// Identity transform (no translation, no rotation, unit scale and stretch).
    pub const fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::identity(),
            scale: 1.0,
            stretch: Vec3::ONE,
        }
    }

    /// Creates a transform from components.
    pub const fn new(position: Vec3, rotation: Quat, scale: f32, stretch: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            stretch,
        }
    }

    /// Rigid placement with unit scale.
    pub const fn from_rigid(rigid: RigidTransform) -> Self {
        Self::new(rigid.position, rigid.rotation, 1.0, Vec3::ONE)
    }

    /// Pure translation with unit scale.
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::identity(), 1.0, Vec3::ONE)
    }

    /// Translation component.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation component.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Uniform scale factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Per-axis stretch.
    pub fn stretch(&self) -> Vec3 {
        self.stretch
    }

    /// Same transform moved to `position`.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// The rotation and translation, dropping scale and stretch.
    pub fn rigid(&self) -> RigidTransform {
        RigidTransform::new(self.rotation, self.position)
    }
}
