// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Vec3, EPSILON};

/// Quaternion stored as `(x, y, z, w)` with deterministic float32 rounding.
///
/// * All angles are expressed in radians.
/// * Rotation helpers assume a unit quaternion; use [`Quat::normalize`] after
///   long composition chains.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    data: [f32; 4],
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    /// Creates a quaternion from components.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// Returns the identity quaternion.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Returns the quaternion as an array.
    pub fn to_array(self) -> [f32; 4] {
        self.data
    }

    /// Constructs a quaternion from a rotation axis and angle in radians.
    ///
    /// Returns the identity quaternion when the axis length is ≤ `EPSILON`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len_sq = axis.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return Self::identity();
        }
        let norm_axis = axis.scale(1.0 / len_sq.sqrt());
        let (sin_half, cos_half) = (angle * 0.5).sin_cos();
        let scaled = norm_axis.scale(sin_half);
        Self::new(scaled.x(), scaled.y(), scaled.z(), cos_half)
    }

    /// Hamilton product of two quaternions (`self * other`).
    ///
    /// The result applies `other` first and then `self` when rotating vectors.
    pub fn multiply(&self, other: &Self) -> Self {
        let [ax, ay, az, aw] = self.data;
        let [bx, by, bz, bw] = other.data;
        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Normalises the quaternion; returns identity when norm is ~0.
    pub fn normalize(&self) -> Self {
        let [x, y, z, w] = self.data;
        let len = (x * x + y * y + z * z + w * w).sqrt();
        if len <= EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / len;
        Self::new(x * inv, y * inv, z * inv, w * inv)
    }

    /// Conjugate, which is the inverse rotation for unit quaternions.
    pub fn conjugate(&self) -> Self {
        let [x, y, z, w] = self.data;
        Self::new(-x, -y, -z, w)
    }

    /// Rotates a vector by this (unit) quaternion.
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let [x, y, z, w] = self.data;
        let u = Vec3::new(x, y, z);
        let t = u.cross(v).scale(2.0);
        v.add(&t.scale(w)).add(&u.cross(&t))
    }

    /// Rotates a vector by the inverse of this (unit) quaternion.
    pub fn inverse_rotate(&self, v: &Vec3) -> Vec3 {
        self.conjugate().rotate(v)
    }

    /// The three rotated basis vectors (columns of the rotation matrix).
    pub fn basis(&self) -> [Vec3; 3] {
        [
            self.rotate(&Vec3::UNIT_X),
            self.rotate(&Vec3::UNIT_Y),
            self.rotate(&Vec3::UNIT_Z),
        ]
    }
}

/// Converts a 4-element `[f32; 4]` array `(x, y, z, w)` into a `Quat`.
/// The components are taken verbatim; normalisation is not enforced.
impl From<[f32; 4]> for Quat {
    fn from(value: [f32; 4]) -> Self {
        Self { data: value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.sub(&b).length() < 1e-5
    }

    #[test]
    fn quarter_turn_about_z_maps_x_to_y() {
        let q = Quat::from_axis_angle(Vec3::UNIT_Z, FRAC_PI_2);
        assert!(approx(q.rotate(&Vec3::UNIT_X), Vec3::UNIT_Y));
        assert!(approx(q.inverse_rotate(&Vec3::UNIT_Y), Vec3::UNIT_X));
    }

    #[test]
    fn multiply_applies_right_operand_first() {
        let yaw = Quat::from_axis_angle(Vec3::UNIT_Y, FRAC_PI_2);
        let pitch = Quat::from_axis_angle(Vec3::UNIT_X, FRAC_PI_2);
        let v = Vec3::UNIT_Z;
        let composed = yaw.multiply(&pitch).rotate(&v);
        let stepwise = yaw.rotate(&pitch.rotate(&v));
        assert!(approx(composed, stepwise));
    }
}
