// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Quat, Vec3};

/// Axis-aligned bounding box in world coordinates.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components, unless a
///   component is NaN. NaN boxes are representable so that the collision
///   index can quarantine them instead of panicking mid-build.
/// - Values are `f32` and represent metres.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Constructs an AABB from its minimum and maximum corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            !(min.x() > max.x() || min.y() > max.y() || min.z() > max.z()),
            "invalid AABB: min > max"
        );
        Self { min, max }
    }

    /// Returns the minimum corner.
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Returns the maximum corner.
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Builds an AABB centred at `center` with half-extents `half`.
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self::new(center - half, center + half)
    }

    /// Centre point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-extents (non-negative for valid boxes).
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns `true` if this AABB overlaps another (inclusive on faces).
    ///
    /// Any NaN component makes the comparison fail, so NaN boxes never overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x() <= other.max.x()
            && self.max.x() >= other.min.x()
            && self.min.y() <= other.max.y()
            && self.max.y() >= other.min.y()
            && self.min.z() <= other.max.z()
            && self.max.z() >= other.min.z()
    }

    /// Returns `true` if `point` lies inside or on the box.
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x() >= self.min.x()
            && point.x() <= self.max.x()
            && point.y() >= self.min.y()
            && point.y() <= self.max.y()
            && point.z() >= self.min.z()
            && point.z() <= self.max.z()
    }

    /// Returns the union of two AABBs.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min_elem(&other.min),
            max: self.max.max_elem(&other.max),
        }
    }

    /// Grows the box to include `point`.
    pub fn include_point(&self, point: &Vec3) -> Self {
        Self {
            min: self.min.min_elem(point),
            max: self.max.max_elem(point),
        }
    }

    /// Inflates the box by a uniform margin `m` in all directions.
    pub fn inflate(&self, m: f32) -> Self {
        let delta = Vec3::splat(m);
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Computes the AABB bounding this box after a rotation and translation.
    ///
    /// Uses the absolute rotation basis so the result is exact for boxes and
    /// conservative for everything the box bounds.
    pub fn rotated_translated(&self, rotation: &Quat, translation: &Vec3) -> Self {
        let center = rotation.rotate(&self.center()) + *translation;
        let half = self.half_extents();
        let [bx, by, bz] = rotation.basis();
        let extents = bx.abs() * half.x() + by.abs() * half.y() + bz.abs() * half.z();
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Builds the minimal AABB that contains all `points`, or `None` if empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut out = Self {
            min: *first,
            max: *first,
        };
        for p in rest {
            out = out.include_point(p);
        }
        Some(out)
    }

    /// `true` when any component is NaN.
    pub fn has_nan(&self) -> bool {
        self.min.has_nan() || self.max.has_nan()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_4;

    #[test]
    fn touching_faces_overlap() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_half_extents(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE);
        assert!(a.overlaps(&b));
        let c = Aabb::from_center_half_extents(Vec3::new(2.1, 0.0, 0.0), Vec3::ONE);
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn nan_never_overlaps() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let n = Aabb::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE);
        assert!(n.has_nan());
        assert!(!a.overlaps(&n));
        assert!(!n.overlaps(&a));
    }

    #[test]
    fn rotated_unit_cube_grows_by_sqrt2() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let q = Quat::from_axis_angle(Vec3::UNIT_Z, FRAC_PI_4);
        let r = a.rotated_translated(&q, &Vec3::new(1.0, 0.0, 0.0));
        let s = core::f32::consts::SQRT_2;
        assert!((r.max().x() - (1.0 + s)).abs() < 1e-5);
        assert!((r.max().y() - s).abs() < 1e-5);
        assert!((r.max().z() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Aabb::from_points(&[]).is_none());
        let b = Aabb::from_points(&[Vec3::new(1.0, -1.0, 0.0), Vec3::new(-1.0, 2.0, 3.0)]);
        let b = b.map(|b| (b.min().to_array(), b.max().to_array()));
        assert_eq!(b, Some(([-1.0, -1.0, 0.0], [1.0, 2.0, 3.0])));
    }
}
