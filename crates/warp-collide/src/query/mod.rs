// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Narrow-phase queries.
//!
//! Every query scales its shapes by their transform's scale and stretch
//! first, then works in a rigid local frame and maps the answer back to
//! world space. Composite shapes (meshes, terrain, compounds) are walked one
//! sub-shape at a time; a later sub-shape replaces the current best only when
//! strictly better, so the first one wins ties.
//!
//! Misses are `None`. The only error is asking to sweep a shape kind that
//! cannot be swept.

mod cast;
mod distance;
mod gjk;
mod layer;
mod point;
mod raycast;

use warp_geom::{Aabb, Collider, RigidTransform, Vec3};

pub use cast::{collider_cast, ColliderCastResult};
pub use distance::{distance_between, DistanceResult};
pub use layer::LayerBodyInfo;
pub use point::{point_distance, PointDistanceResult};
pub use raycast::{raycast, RaycastResult};

/// Calls `visit(sub_index, shape, placement)` for every sub-shape of the
/// composite `collider` that may overlap `query`, both in the collider's
/// local (scaled) space. Primitives are visited once as themselves.
pub(crate) fn for_each_subshape(
    collider: &Collider,
    query: &Aabb,
    mut visit: impl FnMut(u32, &Collider, &RigidTransform),
) {
    match collider {
        Collider::TriangleMesh(mesh) => mesh.for_each_triangle_in(query, |index, tri| {
            visit(index, &Collider::Triangle(tri), &RigidTransform::identity());
        }),
        Collider::Terrain(terrain) => terrain.for_each_triangle_in(query, |index, tri| {
            visit(index, &Collider::Triangle(tri), &RigidTransform::identity());
        }),
        Collider::Compound(compound) => {
            for (index, (child, placement)) in compound.children().enumerate() {
                let bounds = child
                    .local_aabb()
                    .rotated_translated(&placement.rotation(), &placement.position());
                if bounds.overlaps(query) {
                    visit(u32::try_from(index).unwrap_or(u32::MAX), &child, &placement);
                }
            }
        }
        _ => visit(0, collider, &RigidTransform::identity()),
    }
}

/// Bounds of `collider` placed by `placement`.
pub(crate) fn placed_aabb(collider: &Collider, placement: &RigidTransform) -> Aabb {
    collider
        .local_aabb()
        .rotated_translated(&placement.rotation(), &placement.position())
}

/// Axis-aligned unit normal of the face of `[-half, half]` nearest to `p`;
/// the first axis wins ties. Returns `(axis, sign, face_distance)`.
pub(crate) fn nearest_box_face(p: &Vec3, half: &Vec3) -> (usize, f32, f32) {
    let mut axis = 0;
    let mut best = f32::INFINITY;
    for i in 0..3 {
        let d = half.component(i) - p.component(i).abs();
        if d < best {
            best = d;
            axis = i;
        }
    }
    let sign = if p.component(axis) < 0.0 { -1.0 } else { 1.0 };
    (axis, sign, best)
}

/// Unit vector along `axis` with `sign`.
pub(crate) fn axis_normal(axis: usize, sign: f32) -> Vec3 {
    Vec3::ZERO.with_component(axis, sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_face_prefers_first_axis_on_ties() {
        let (axis, sign, d) = nearest_box_face(&Vec3::new(0.5, -0.5, 0.0), &Vec3::ONE);
        assert_eq!((axis, d.to_bits()), (0, 0.5f32.to_bits()));
        assert!(sign > 0.0);
        let (axis, sign, _) = nearest_box_face(&Vec3::new(0.0, -0.9, 0.1), &Vec3::ONE);
        assert_eq!(axis, 1);
        assert!(sign < 0.0);
    }
}
