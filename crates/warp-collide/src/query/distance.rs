// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed distance between two colliders.

use warp_geom::{Collider, RigidTransform, TransformQvvs, Vec3};

use super::gjk::{core_contact, decompose, Placed};
use super::{for_each_subshape, placed_aabb};

/// Closest points between two colliders, in world space.
///
/// `normal_a` points out of A toward B and `normal_b` out of B toward A.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceResult {
    /// Closest point on A's surface.
    pub hitpoint_a: Vec3,
    /// Closest point on B's surface.
    pub hitpoint_b: Vec3,
    /// Surface normal of A at `hitpoint_a`.
    pub normal_a: Vec3,
    /// Surface normal of B at `hitpoint_b`.
    pub normal_b: Vec3,
    /// Gap between the surfaces; negative when they overlap.
    pub distance: f32,
    /// Sub-shape of A that produced the result.
    pub subcollider_index_a: u32,
    /// Sub-shape of B that produced the result.
    pub subcollider_index_b: u32,
}

impl DistanceResult {
    pub(crate) fn mapped(&self, frame: &RigidTransform) -> Self {
        Self {
            hitpoint_a: frame.transform_point(&self.hitpoint_a),
            hitpoint_b: frame.transform_point(&self.hitpoint_b),
            normal_a: frame.transform_direction(&self.normal_a),
            normal_b: frame.transform_direction(&self.normal_b),
            ..*self
        }
    }
}

/// Distance between `a` and `b`, or `None` when it exceeds `max_distance`.
pub fn distance_between(
    a: &Collider,
    a_transform: &TransformQvvs,
    b: &Collider,
    b_transform: &TransformQvvs,
    max_distance: f32,
) -> Option<DistanceResult> {
    let scaled_a = a.scaled(a_transform.scale(), a_transform.stretch());
    let scaled_b = b.scaled(b_transform.scale(), b_transform.stretch());
    let frame_a = a_transform.rigid();
    let b_in_a = frame_a.inverse_multiply(&b_transform.rigid());
    distance_local(&scaled_a, &scaled_b, &b_in_a, max_distance).map(|hit| hit.mapped(&frame_a))
}

/// Distance with both colliders scaled and B placed in A's frame.
pub(crate) fn distance_local(
    a: &Collider,
    b: &Collider,
    b_in_a: &RigidTransform,
    max_distance: f32,
) -> Option<DistanceResult> {
    match (decompose(a), decompose(b)) {
        (Some((core_a, radius_a)), Some((core_b, radius_b))) => {
            let placed_a = Placed {
                core: core_a,
                frame: RigidTransform::identity(),
            };
            let placed_b = Placed {
                core: core_b,
                frame: *b_in_a,
            };
            let contact = core_contact(&placed_a, &placed_b);
            let distance = contact.separation - radius_a - radius_b;
            (distance <= max_distance).then(|| DistanceResult {
                hitpoint_a: contact.point_a + contact.normal * radius_a,
                hitpoint_b: contact.point_b - contact.normal * radius_b,
                normal_a: contact.normal,
                normal_b: -contact.normal,
                distance,
                subcollider_index_a: 0,
                subcollider_index_b: 0,
            })
        }
        (None, _) => {
            let query = placed_aabb(b, b_in_a).inflate(max_distance);
            let mut best: Option<DistanceResult> = None;
            for_each_subshape(a, &query, |index, sub, placement| {
                let b_in_sub = placement.inverse_multiply(b_in_a);
                if let Some(hit) = distance_local(sub, b, &b_in_sub, max_distance) {
                    if best.is_none_or(|best| hit.distance < best.distance) {
                        best = Some(DistanceResult {
                            subcollider_index_a: index,
                            ..hit.mapped(placement)
                        });
                    }
                }
            });
            best
        }
        (Some(_), None) => {
            let query = placed_aabb(a, &b_in_a.inverse()).inflate(max_distance);
            let mut best: Option<DistanceResult> = None;
            for_each_subshape(b, &query, |index, sub, placement| {
                let sub_in_a = b_in_a.multiply(placement);
                if let Some(hit) = distance_local(a, sub, &sub_in_a, max_distance) {
                    if best.is_none_or(|best| hit.distance < best.distance) {
                        best = Some(DistanceResult {
                            subcollider_index_b: index,
                            ..hit
                        });
                    }
                }
            });
            best
        }
    }
}
