// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Linear sweeps of one collider against another.
//!
//! The caster translates from its start transform to a new position without
//! rotating. Sphere casts against spheres, capsules and boxes, and capsule
//! casts against spheres, reduce to a ray against the inflated target. Every
//! other pair advances conservatively along the sweep using the distance
//! query. Pairs that already touch at the start do not hit.

use warp_geom::math::EPSILON;
use warp_geom::{Aabb, Collider, ColliderKind, Ray, RigidTransform, TransformQvvs, Vec3};

use super::distance::{distance_local, DistanceResult};
use super::raycast::{raycast_capsule_segment, raycast_rounded_box, raycast_sphere_at};
use super::{for_each_subshape, placed_aabb};
use crate::error::CollideError;

const MAX_ADVANCE_ITERATIONS: usize = 64;
const CONTACT_TOLERANCE: f32 = 1e-4;
const SETTLE_TOLERANCE: f32 = 1e-2;

/// First contact of a sweep, in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColliderCastResult {
    /// Contact point on the caster at the time of impact.
    pub hitpoint_on_caster: Vec3,
    /// Contact point on the target.
    pub hitpoint_on_target: Vec3,
    /// Caster surface normal at the contact.
    pub normal_on_caster: Vec3,
    /// Target surface normal at the contact.
    pub normal_on_target: Vec3,
    /// Distance the caster travelled before touching.
    pub distance: f32,
    /// Child of a compound caster that touched, `0` otherwise.
    pub subcollider_index_on_caster: u32,
    /// Sub-shape of the target that was touched.
    pub subcollider_index_on_target: u32,
}

/// Sweep result in the target's frame; A is the target, B the caster.
#[derive(Debug, Copy, Clone)]
struct LocalCast {
    fraction: f32,
    contact: DistanceResult,
}

/// Sweeps `caster` from `caster_start` to `caster_end_position` against
/// `target`. Returns `Ok(None)` for a miss or a pair that starts touching.
///
/// # Errors
/// [`CollideError::UnsupportedCast`] when the caster is a triangle mesh or
/// terrain.
pub fn collider_cast(
    caster: &Collider,
    caster_start: &TransformQvvs,
    caster_end_position: &Vec3,
    target: &Collider,
    target_transform: &TransformQvvs,
) -> Result<Option<ColliderCastResult>, CollideError> {
    let kind = caster.kind();
    if matches!(kind, ColliderKind::TriangleMesh | ColliderKind::Terrain) {
        return Err(CollideError::UnsupportedCast { caster: kind });
    }
    let scaled_caster = caster.scaled(caster_start.scale(), caster_start.stretch());
    let scaled_target = target.scaled(target_transform.scale(), target_transform.stretch());
    let frame = target_transform.rigid();
    let caster_in_target = frame.inverse_multiply(&caster_start.rigid());
    let travel = *caster_end_position - caster_start.position();
    let delta = frame.inverse_transform_direction(&travel);
    if delta.length() < EPSILON {
        return Ok(None);
    }
    let Some(hit) = cast_local(&scaled_caster, &caster_in_target, &delta, &scaled_target) else {
        return Ok(None);
    };
    let c = hit.contact;
    Ok(Some(ColliderCastResult {
        hitpoint_on_caster: frame.transform_point(&c.hitpoint_b),
        hitpoint_on_target: frame.transform_point(&c.hitpoint_a),
        normal_on_caster: frame.transform_direction(&c.normal_b),
        normal_on_target: frame.transform_direction(&c.normal_a),
        distance: hit.fraction * travel.length(),
        subcollider_index_on_caster: c.subcollider_index_b,
        subcollider_index_on_target: c.subcollider_index_a,
    }))
}

fn keep_earliest(best: &mut Option<LocalCast>, candidate: LocalCast) {
    if best.is_none_or(|b| candidate.fraction < b.fraction) {
        *best = Some(candidate);
    }
}

fn moved(frame: &RigidTransform, offset: Vec3) -> RigidTransform {
    RigidTransform::new(frame.rotation(), frame.position() + offset)
}

/// Sweep with the caster placed in the target's frame.
fn cast_local(caster: &Collider, caster_tf: &RigidTransform, delta: &Vec3, target: &Collider) -> Option<LocalCast> {
    if let Collider::Compound(compound) = caster {
        let mut best = None;
        for (index, (child, placement)) in compound.children().enumerate() {
            let child_tf = caster_tf.multiply(&placement);
            if let Some(mut hit) = cast_local(&child, &child_tf, delta, target) {
                hit.contact.subcollider_index_b = u32::try_from(index).unwrap_or(u32::MAX);
                keep_earliest(&mut best, hit);
            }
        }
        return best;
    }
    if target.kind().is_composite() {
        let start = placed_aabb(caster, caster_tf);
        let end = Aabb::new(start.min() + *delta, start.max() + *delta);
        let mut best = None;
        for_each_subshape(target, &start.union(&end), |index, sub, placement| {
            let local_tf = placement.inverse_multiply(caster_tf);
            let local_delta = placement.inverse_transform_direction(delta);
            if let Some(hit) = cast_local(caster, &local_tf, &local_delta, sub) {
                let contact = DistanceResult {
                    subcollider_index_a: index,
                    ..hit.contact.mapped(placement)
                };
                keep_earliest(&mut best, LocalCast { contact, ..hit });
            }
        });
        return best;
    }
    let fraction = cast_primitive(caster, caster_tf, delta, target)?;
    let contact = distance_local(target, caster, &moved(caster_tf, *delta * fraction), f32::INFINITY)?;
    Some(LocalCast { fraction, contact })
}

/// Time of impact of two convex primitives, in `[0, 1]`.
fn cast_primitive(caster: &Collider, caster_tf: &RigidTransform, delta: &Vec3, target: &Collider) -> Option<f32> {
    if distance_local(target, caster, caster_tf, 0.0).is_some() {
        return None;
    }
    let hit = match (caster, target) {
        (Collider::Sphere(cs), Collider::Sphere(ts)) => {
            let center = caster_tf.transform_point(&cs.center);
            raycast_sphere_at(&Ray::new(center, center + *delta), &ts.center, ts.radius + cs.radius)
        }
        (Collider::Sphere(cs), Collider::Capsule(tc)) => {
            let center = caster_tf.transform_point(&cs.center);
            raycast_capsule_segment(
                &Ray::new(center, center + *delta),
                &tc.point_a,
                &tc.point_b,
                tc.radius + cs.radius,
            )
        }
        (Collider::Sphere(cs), Collider::Box(tb)) => {
            let center = caster_tf.transform_point(&cs.center);
            raycast_rounded_box(&Ray::new(center, center + *delta), &tb.center, &tb.half_size, cs.radius)
        }
        (Collider::Capsule(cc), Collider::Sphere(ts)) => {
            // The sphere moves against the capsule.
            let a = caster_tf.transform_point(&cc.point_a);
            let b = caster_tf.transform_point(&cc.point_b);
            raycast_capsule_segment(&Ray::new(ts.center, ts.center - *delta), &a, &b, cc.radius + ts.radius)
        }
        _ => return conservative_advancement(caster, caster_tf, delta, target),
    };
    hit.map(|h| h.fraction)
}

fn conservative_advancement(
    caster: &Collider,
    caster_tf: &RigidTransform,
    delta: &Vec3,
    target: &Collider,
) -> Option<f32> {
    advance_within(caster, caster_tf, delta, target, MAX_ADVANCE_ITERATIONS)
}

/// Conservative advancement with at most `budget` steps. A sweep that runs
/// out of steps still hits when it ends within [`SETTLE_TOLERANCE`] of the
/// target; otherwise it is a miss.
fn advance_within(
    caster: &Collider,
    caster_tf: &RigidTransform,
    delta: &Vec3,
    target: &Collider,
    budget: usize,
) -> Option<f32> {
    let mut t = 0.0f32;
    for _ in 0..budget {
        let contact = distance_local(target, caster, &moved(caster_tf, *delta * t), f32::INFINITY)?;
        if contact.distance <= CONTACT_TOLERANCE {
            return Some(t);
        }
        let closing = -delta.dot(&contact.normal_a);
        if closing <= EPSILON {
            return None;
        }
        t += contact.distance / closing;
        if t > 1.0 {
            return None;
        }
    }
    let contact = distance_local(target, caster, &moved(caster_tf, *delta * t), f32::INFINITY)?;
    (contact.distance <= SETTLE_TOLERANCE).then_some(t)
}
