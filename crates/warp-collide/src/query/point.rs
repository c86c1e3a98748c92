// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed distance from a point to a collider surface.

use warp_geom::math::EPSILON;
use warp_geom::shapes::{ConvexCollider, TriangleCollider};
use warp_geom::{Aabb, Collider, RigidTransform, TransformQvvs, Vec3};

use super::gjk::{core_contact, Core, Placed};
use super::{axis_normal, for_each_subshape, nearest_box_face};

/// Closest surface point to a query point, in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointDistanceResult {
    /// Closest point on the collider surface.
    pub hitpoint: Vec3,
    /// Outward surface normal at `hitpoint`.
    pub normal: Vec3,
    /// Distance to the surface; negative when the point is inside.
    pub distance: f32,
    /// Triangle index for meshes and terrain, child index for compounds,
    /// `0` otherwise.
    pub subcollider_index: u32,
}

/// Distance from `point` to `collider` placed by `transform`, or `None` when
/// it exceeds `max_distance`.
pub fn point_distance(
    point: &Vec3,
    collider: &Collider,
    transform: &TransformQvvs,
    max_distance: f32,
) -> Option<PointDistanceResult> {
    let scaled = collider.scaled(transform.scale(), transform.stretch());
    let rigid = transform.rigid();
    let local = point_distance_local(&rigid.inverse_transform_point(point), &scaled, max_distance)?;
    Some(PointDistanceResult {
        hitpoint: rigid.transform_point(&local.hitpoint),
        normal: rigid.transform_direction(&local.normal),
        ..local
    })
}

/// Point query against an already scaled collider in its own frame.
pub(crate) fn point_distance_local(p: &Vec3, collider: &Collider, max_distance: f32) -> Option<PointDistanceResult> {
    let hit = match collider {
        Collider::Sphere(s) => Some(round_point(p, &s.center, s.radius)),
        Collider::Capsule(c) => {
            let axis = c.point_b - c.point_a;
            let dd = axis.dot(&axis);
            let t = if dd <= EPSILON * EPSILON {
                0.0
            } else {
                ((*p - c.point_a).dot(&axis) / dd).clamp(0.0, 1.0)
            };
            Some(round_point(p, &(c.point_a + axis * t), c.radius))
        }
        Collider::Box(b) => Some(box_point(p, &b.center, &b.half_size)),
        Collider::Triangle(t) => Some(triangle_point(p, t)),
        Collider::Convex(c) => convex_point(p, c),
        Collider::TriangleMesh(_) | Collider::Terrain(_) | Collider::Compound(_) => {
            let query = Aabb::from_center_half_extents(*p, Vec3::splat(max_distance));
            let mut best: Option<PointDistanceResult> = None;
            for_each_subshape(collider, &query, |index, shape, placement: &RigidTransform| {
                let local = placement.inverse_transform_point(p);
                if let Some(hit) = point_distance_local(&local, shape, max_distance) {
                    if best.is_none_or(|b| hit.distance < b.distance) {
                        best = Some(PointDistanceResult {
                            hitpoint: placement.transform_point(&hit.hitpoint),
                            normal: placement.transform_direction(&hit.normal),
                            distance: hit.distance,
                            subcollider_index: index,
                        });
                    }
                }
            });
            best
        }
    }?;
    (hit.distance <= max_distance).then_some(hit)
}

fn result(hitpoint: Vec3, normal: Vec3, distance: f32) -> PointDistanceResult {
    PointDistanceResult {
        hitpoint,
        normal,
        distance,
        subcollider_index: 0,
    }
}

/// Sphere of `radius` around `center`.
fn round_point(p: &Vec3, center: &Vec3, radius: f32) -> PointDistanceResult {
    let v = *p - *center;
    let len = v.length();
    let normal = if len > EPSILON { v / len } else { Vec3::UNIT_Y };
    result(*center + normal * radius, normal, len - radius)
}

fn box_point(p: &Vec3, center: &Vec3, half: &Vec3) -> PointDistanceResult {
    let local = *p - *center;
    let clamped = local.max_elem(&(-*half)).min_elem(half);
    let gap = local - clamped;
    let len = gap.length();
    if len > 0.0 {
        return result(*center + clamped, gap / len, len);
    }
    let (axis, sign, face_distance) = nearest_box_face(&local, half);
    let on_face = local.with_component(axis, sign * half.component(axis));
    result(*center + on_face, axis_normal(axis, sign), -face_distance)
}

/// Closest point on triangle `abc` to `p`.
pub(crate) fn closest_point_on_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = *b - *a;
    let ac = *c - *a;
    let ap = *p - *a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }
    let bp = *p - *b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return *a + ab * (d1 / (d1 - d3));
    }
    let cp = *p - *c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return *a + ac * (d2 / (d2 - d6));
    }
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return *b + (*c - *b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }
    let sum = va + vb + vc;
    if sum.abs() <= f32::MIN_POSITIVE {
        return *a;
    }
    *a + ab * (vb / sum) + ac * (vc / sum)
}

fn triangle_point(p: &Vec3, tri: &TriangleCollider) -> PointDistanceResult {
    let [a, b, c] = tri.points;
    let q = closest_point_on_triangle(p, &a, &b, &c);
    let gap = *p - q;
    let len = gap.length();
    let normal = if len > EPSILON {
        gap / len
    } else {
        tri.raw_normal().normalize_or(Vec3::UNIT_Y)
    };
    result(q, normal, len)
}

/// Inside: deepest scaled face plane. Outside: GJK against the hull.
fn convex_point(p: &Vec3, convex: &ConvexCollider) -> Option<PointDistanceResult> {
    let scale = convex.scale;
    if (0..3).any(|i| scale.component(i).abs() <= EPSILON) {
        return None;
    }
    let mut deepest: Option<(f32, Vec3)> = None;
    for face in convex.blob.faces() {
        let n = face.normal.div_elem(&scale);
        let len = n.length();
        if len <= EPSILON {
            continue;
        }
        let normal = n / len;
        let signed = normal.dot(p) - face.distance / len;
        if deepest.is_none_or(|(d, _)| signed > d) {
            deepest = Some((signed, normal));
        }
    }
    let (signed, normal) = deepest?;
    if signed <= 0.0 {
        return Some(result(*p - normal * signed, normal, signed));
    }
    let point = Placed {
        core: Core::Point(*p),
        frame: RigidTransform::identity(),
    };
    let hull = Placed {
        core: Core::Hull(convex),
        frame: RigidTransform::identity(),
    };
    let contact = core_contact(&point, &hull);
    Some(result(contact.point_b, -contact.normal, contact.separation.max(0.0)))
}
