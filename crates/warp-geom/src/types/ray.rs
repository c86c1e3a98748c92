// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::Vec3;
use crate::types::aabb::Aabb;
use crate::types::transform::RigidTransform;

/// Finite ray segment from `start` to `end`.
///
/// Hits are reported as a `fraction` in `[0, 1]` along the segment. Fractions
/// are invariant under affine maps of the segment, which lets narrow-phase
/// code cast in whichever local space is convenient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    start: Vec3,
    end: Vec3,
}

impl Ray {
    /// Ray from `start` to `end`.
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Ray from `start` travelling `length` metres along `direction`.
    ///
    /// `direction` is normalised; a degenerate direction yields a zero-length ray.
    pub fn from_direction(start: Vec3, direction: Vec3, length: f32) -> Self {
        Self::new(start, start + direction.normalize() * length)
    }

    /// Start point.
    pub fn start(&self) -> Vec3 {
        self.start
    }

    /// End point.
    pub fn end(&self) -> Vec3 {
        self.end
    }

    /// `end - start`.
    pub fn displacement(&self) -> Vec3 {
        self.end - self.start
    }

    /// Segment length.
    pub fn length(&self) -> f32 {
        self.displacement().length()
    }

    /// Point at `fraction` along the segment.
    pub fn point_at(&self, fraction: f32) -> Vec3 {
        self.start.lerp(&self.end, fraction)
    }

    /// Bounds of the segment.
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.start.min_elem(&self.end), self.start.max_elem(&self.end))
    }

    /// Same segment expressed in `frame`'s local space.
    pub fn to_local(&self, frame: &RigidTransform) -> Self {
        Self::new(
            frame.inverse_transform_point(&self.start),
            frame.inverse_transform_point(&self.end),
        )
    }

    /// Same segment with each axis divided by `scale` (into unscaled shape space).
    pub fn unscaled(&self, scale: &Vec3) -> Self {
        Self::new(self.start.div_elem(scale), self.end.div_elem(scale))
    }

    /// Same segment ending at `fraction` of the original.
    pub fn truncated(&self, fraction: f32) -> Self {
        Self::new(self.start, self.point_at(fraction))
    }
}
