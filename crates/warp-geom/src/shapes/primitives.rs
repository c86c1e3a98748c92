// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sphere, capsule, box and triangle colliders with their stretch policies.

use crate::math::Vec3;
use crate::types::aabb::Aabb;

/// How a sphere responds to non-uniform stretch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SphereStretchMode {
    /// Center moves with `stretch * scale`; radius follows `scale` only.
    #[default]
    StretchCenter,
    /// Center and radius both follow `scale` only.
    IgnoreStretch,
}

/// How a capsule responds to non-uniform stretch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CapsuleStretchMode {
    /// Endpoints move with `stretch * scale`; radius follows `scale` only.
    #[default]
    StretchPoints,
    /// Endpoints and radius both follow `scale` only.
    IgnoreStretch,
}

/// Sphere in collider-local space.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphereCollider {
    /// Center.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
    /// Stretch policy.
    pub stretch_mode: SphereStretchMode,
}

impl SphereCollider {
    /// Sphere with the default stretch policy.
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            stretch_mode: SphereStretchMode::StretchCenter,
        }
    }

    /// Same sphere with `mode` as its stretch policy.
    pub const fn with_stretch_mode(mut self, mode: SphereStretchMode) -> Self {
        self.stretch_mode = mode;
        self
    }

    /// Bakes `scale` and `stretch` into the sphere parameters.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        let center = match self.stretch_mode {
            SphereStretchMode::StretchCenter => self.center.mul_elem(&stretch) * scale,
            SphereStretchMode::IgnoreStretch => self.center * scale,
        };
        Self {
            center,
            radius: self.radius * scale,
            stretch_mode: self.stretch_mode,
        }
    }

    /// Local bounds.
    pub fn local_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, Vec3::splat(self.radius))
    }
}

/// Capsule (swept sphere) between two endpoints.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapsuleCollider {
    /// First endpoint of the inner segment.
    pub point_a: Vec3,
    /// Second endpoint of the inner segment.
    pub point_b: Vec3,
    /// Radius around the segment.
    pub radius: f32,
    /// Stretch policy.
    pub stretch_mode: CapsuleStretchMode,
}

impl CapsuleCollider {
    /// Capsule with the default stretch policy.
    pub const fn new(point_a: Vec3, point_b: Vec3, radius: f32) -> Self {
        Self {
            point_a,
            point_b,
            radius,
            stretch_mode: CapsuleStretchMode::StretchPoints,
        }
    }

    /// Same capsule with `mode` as its stretch policy.
    pub const fn with_stretch_mode(mut self, mode: CapsuleStretchMode) -> Self {
        self.stretch_mode = mode;
        self
    }

    /// Bakes `scale` and `stretch` into the capsule parameters.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        let factor = match self.stretch_mode {
            CapsuleStretchMode::StretchPoints => stretch * scale,
            CapsuleStretchMode::IgnoreStretch => Vec3::splat(scale),
        };
        Self {
            point_a: self.point_a.mul_elem(&factor),
            point_b: self.point_b.mul_elem(&factor),
            radius: self.radius * scale,
            stretch_mode: self.stretch_mode,
        }
    }

    /// Local bounds.
    pub fn local_aabb(&self) -> Aabb {
        Aabb::new(
            self.point_a.min_elem(&self.point_b) - Vec3::splat(self.radius),
            self.point_a.max_elem(&self.point_b) + Vec3::splat(self.radius),
        )
    }
}

/// Axis-aligned box in collider-local space.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxCollider {
    /// Center.
    pub center: Vec3,
    /// Half extents (non-negative).
    pub half_size: Vec3,
}

impl BoxCollider {
    /// Box from center and half extents.
    pub const fn new(center: Vec3, half_size: Vec3) -> Self {
        Self { center, half_size }
    }

    /// Bakes `scale` and `stretch` into the box.
    ///
    /// Both opposite corners are mapped independently and the box is rebuilt
    /// from their midpoint, so negative stretch mirrors the box instead of
    /// inverting it.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        let factor = stretch * scale;
        let positive = (self.center + self.half_size).mul_elem(&factor);
        let negative = (self.center - self.half_size).mul_elem(&factor);
        let center = (positive + negative) * 0.5;
        Self {
            center,
            half_size: (positive - center).abs(),
        }
    }

    /// Local bounds.
    pub fn local_aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, self.half_size)
    }
}

/// Single triangle; raycasts treat it as double-sided.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleCollider {
    /// Vertices.
    pub points: [Vec3; 3],
}

impl TriangleCollider {
    /// Triangle from three points.
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { points: [a, b, c] }
    }

    /// Bakes `scale * stretch` into every vertex.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        let factor = stretch * scale;
        Self {
            points: self.points.map(|p| p.mul_elem(&factor)),
        }
    }

    /// Unnormalised face normal (`(b - a) × (c - a)`).
    pub fn raw_normal(&self) -> Vec3 {
        let [a, b, c] = self.points;
        (b - a).cross(&(c - a))
    }

    /// Local bounds.
    pub fn local_aabb(&self) -> Aabb {
        let [a, b, c] = self.points;
        Aabb::new(a.min_elem(&b).min_elem(&c), a.max_elem(&b).max_elem(&c))
    }
}
