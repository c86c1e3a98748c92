// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ray casts against single colliders.
//!
//! Rays are finite segments; a hit is reported as the fraction of the
//! segment travelled. A ray starting inside a solid shape does not hit it.
//! Triangles are two-sided and report the normal facing the ray.

use warp_geom::math::EPSILON;
use warp_geom::shapes::{
    BoxCollider, CapsuleCollider, ConvexCollider, SphereCollider, TriangleCollider,
};
use warp_geom::{Collider, Ray, TransformQvvs, Vec3};

use super::{axis_normal, for_each_subshape, nearest_box_face};

/// Ray hit in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RaycastResult {
    /// Hit point.
    pub position: Vec3,
    /// Surface normal at the hit, facing the ray.
    pub normal: Vec3,
    /// Distance travelled from the ray start.
    pub distance: f32,
    /// Fraction of the ray travelled, in `[0, 1]`.
    pub fraction: f32,
    /// Triangle index for meshes and terrain, child index for compounds,
    /// `0` otherwise.
    pub subcollider_index: u32,
}

/// Hit in the collider's local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct RayHit {
    pub fraction: f32,
    pub normal: Vec3,
    pub subcollider_index: u32,
}

impl RayHit {
    fn new(fraction: f32, normal: Vec3) -> Self {
        Self {
            fraction,
            normal,
            subcollider_index: 0,
        }
    }
}

/// Casts `ray` against `collider` placed by `transform`.
pub fn raycast(ray: &Ray, collider: &Collider, transform: &TransformQvvs) -> Option<RaycastResult> {
    let scaled = collider.scaled(transform.scale(), transform.stretch());
    let rigid = transform.rigid();
    let hit = raycast_local(&ray.to_local(&rigid), &scaled)?;
    Some(RaycastResult {
        position: ray.point_at(hit.fraction),
        normal: rigid.transform_direction(&hit.normal),
        distance: hit.fraction * ray.length(),
        fraction: hit.fraction,
        subcollider_index: hit.subcollider_index,
    })
}

/// Casts a local-space ray against an already scaled collider.
pub(crate) fn raycast_local(ray: &Ray, collider: &Collider) -> Option<RayHit> {
    match collider {
        Collider::Sphere(s) => raycast_sphere(ray, s),
        Collider::Capsule(c) => raycast_capsule(ray, c),
        Collider::Box(b) => raycast_box(ray, b),
        Collider::Triangle(t) => raycast_triangle(ray, t),
        Collider::Convex(c) => raycast_convex(ray, c),
        Collider::TriangleMesh(_) | Collider::Terrain(_) | Collider::Compound(_) => {
            let mut best: Option<RayHit> = None;
            for_each_subshape(collider, &ray.aabb(), |index, shape, placement| {
                let local = ray.to_local(placement);
                if let Some(hit) = raycast_local(&local, shape) {
                    if best.is_none_or(|b| hit.fraction < b.fraction) {
                        best = Some(RayHit {
                            fraction: hit.fraction,
                            normal: placement.transform_direction(&hit.normal),
                            subcollider_index: index,
                        });
                    }
                }
            });
            best
        }
    }
}

/// Sphere of `radius` at `center`.
pub(crate) fn raycast_sphere_at(ray: &Ray, center: &Vec3, radius: f32) -> Option<RayHit> {
    let d = ray.displacement();
    let m = ray.start() - *center;
    let a = d.dot(&d);
    let c = m.dot(&m) - radius * radius;
    if c <= 0.0 || a <= EPSILON * EPSILON {
        return None;
    }
    let b = m.dot(&d);
    if b >= 0.0 {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / a;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let normal = (ray.point_at(t) - *center).normalize_or(-d.normalize());
    Some(RayHit::new(t, normal))
}

fn raycast_sphere(ray: &Ray, sphere: &SphereCollider) -> Option<RayHit> {
    raycast_sphere_at(ray, &sphere.center, sphere.radius)
}

/// Capsule around segment `a..b`: infinite cylinder clipped to the segment,
/// then the two end caps. Nearest of the three wins.
pub(crate) fn raycast_capsule_segment(ray: &Ray, a: &Vec3, b: &Vec3, radius: f32) -> Option<RayHit> {
    let axis = *b - *a;
    let dd = axis.dot(&axis);
    if dd <= EPSILON * EPSILON {
        return raycast_sphere_at(ray, a, radius);
    }
    let m = ray.start() - *a;
    let n = ray.displacement();
    let md = m.dot(&axis);
    let nd = n.dot(&axis);

    // Start inside the capsule.
    let along = (md / dd).clamp(0.0, 1.0);
    let nearest = *a + axis * along;
    if ray.start().distance(&nearest) <= radius {
        return None;
    }

    let mut best: Option<RayHit> = None;
    let nn = n.dot(&n);
    let mn = m.dot(&n);
    let qa = dd * nn - nd * nd;
    if qa.abs() > EPSILON {
        let k = m.dot(&m) - radius * radius;
        let qc = dd * k - md * md;
        let qb = dd * mn - nd * md;
        let disc = qb * qb - qa * qc;
        if disc >= 0.0 {
            let t = (-qb - disc.sqrt()) / qa;
            let axial = md + t * nd;
            if (0.0..=1.0).contains(&t) && (0.0..=dd).contains(&axial) {
                let p = ray.point_at(t);
                let on_axis = *a + axis * (axial / dd);
                best = Some(RayHit::new(t, (p - on_axis).normalize_or(-n.normalize())));
            }
        }
    }
    for cap in [a, b] {
        if let Some(hit) = raycast_sphere_at(ray, cap, radius) {
            if best.is_none_or(|h| hit.fraction < h.fraction) {
                best = Some(hit);
            }
        }
    }
    best
}

fn raycast_capsule(ray: &Ray, capsule: &CapsuleCollider) -> Option<RayHit> {
    raycast_capsule_segment(ray, &capsule.point_a, &capsule.point_b, capsule.radius)
}

/// Slab test against `[-half, half]` in box-centred coordinates; returns the
/// entry fraction and the exit fraction.
fn slab_interval(start: &Vec3, d: &Vec3, half: &Vec3) -> Option<(f32, f32)> {
    let (mut t_enter, mut t_exit) = (0.0f32, 1.0f32);
    for i in 0..3 {
        let (p, di, h) = (start.component(i), d.component(i), half.component(i));
        if di.abs() <= EPSILON {
            if p.abs() > h {
                return None;
            }
            continue;
        }
        let inv = 1.0 / di;
        let (mut t1, mut t2) = ((-h - p) * inv, (h - p) * inv);
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_enter = t_enter.max(t1);
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }
    Some((t_enter, t_exit))
}

fn inside_box(p: &Vec3, half: &Vec3) -> bool {
    (0..3).all(|i| p.component(i).abs() <= half.component(i))
}

fn raycast_box(ray: &Ray, b: &BoxCollider) -> Option<RayHit> {
    raycast_box_centered(ray, &b.center, &b.half_size)
}

pub(crate) fn raycast_box_centered(ray: &Ray, center: &Vec3, half: &Vec3) -> Option<RayHit> {
    let start = ray.start() - *center;
    if inside_box(&start, half) {
        return None;
    }
    let d = ray.displacement();
    let (t, _) = slab_interval(&start, &d, half)?;
    let q = start + d * t;
    let (axis, sign, _) = nearest_box_face(&q, half);
    Some(RayHit::new(t, axis_normal(axis, sign)))
}

/// Box `[-half, half]` around `center` inflated by `radius` with rounded
/// edges and corners (a sphere swept over the box).
pub(crate) fn raycast_rounded_box(ray: &Ray, center: &Vec3, half: &Vec3, radius: f32) -> Option<RayHit> {
    let start = ray.start() - *center;
    let outer = *half + Vec3::splat(radius);
    let d = ray.displacement();
    let (t, _) = slab_interval(&start, &d, &outer)?;

    let clamped = start.max_elem(&(-*half)).min_elem(half);
    if start.distance(&clamped) <= radius {
        return None;
    }

    let q = start + d * t;
    let (axis, sign, _) = nearest_box_face(&(q.div_elem(&outer)), &Vec3::ONE);
    let on_face = (0..3)
        .filter(|&i| i != axis)
        .all(|i| q.component(i).abs() <= half.component(i));
    if on_face {
        return Some(RayHit::new(t, axis_normal(axis, sign)));
    }

    // Edge and corner regions: twelve edge capsules, four per axis.
    let local = Ray::new(start, start + d);
    let mut best: Option<RayHit> = None;
    for along in 0..3 {
        let (u, v) = ((along + 1) % 3, (along + 2) % 3);
        for lane in 0..4 {
            let su = if lane & 1 == 0 { -1.0 } else { 1.0 };
            let sv = if lane & 2 == 0 { -1.0 } else { 1.0 };
            let corner = Vec3::ZERO
                .with_component(u, su * half.component(u))
                .with_component(v, sv * half.component(v));
            let a = corner.with_component(along, -half.component(along));
            let b = corner.with_component(along, half.component(along));
            if let Some(hit) = raycast_capsule_segment(&local, &a, &b, radius) {
                if best.is_none_or(|h| hit.fraction < h.fraction) {
                    best = Some(hit);
                }
            }
        }
    }
    best
}

/// Two-sided Möller–Trumbore.
pub(crate) fn raycast_triangle(ray: &Ray, tri: &TriangleCollider) -> Option<RayHit> {
    let [a, b, c] = tri.points;
    let d = ray.displacement();
    let e1 = b - a;
    let e2 = c - a;
    let pvec = d.cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() <= EPSILON * EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let tvec = ray.start() - a;
    let u = tvec.dot(&pvec) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(&e1);
    let v = d.dot(&qvec) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(&qvec) * inv;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let mut normal = e1.cross(&e2).normalize();
    if normal.dot(&d) > 0.0 {
        normal = -normal;
    }
    Some(RayHit::new(t, normal))
}

/// Plane clipping in unscaled hull space.
fn raycast_convex(ray: &Ray, convex: &ConvexCollider) -> Option<RayHit> {
    let scale = convex.scale;
    if (0..3).any(|i| scale.component(i).abs() <= EPSILON) {
        return None;
    }
    let ray = ray.unscaled(&scale);
    let d = ray.displacement();
    let (mut t_enter, mut t_exit) = (0.0f32, 1.0f32);
    let mut entry_normal = None;
    for face in convex.blob.faces() {
        let denom = face.normal.dot(&d);
        let dist = face.normal.dot(&ray.start()) - face.distance;
        if denom.abs() <= EPSILON * EPSILON {
            if dist > 0.0 {
                return None;
            }
            continue;
        }
        let t = -dist / denom;
        if denom < 0.0 {
            if t > t_enter {
                t_enter = t;
                entry_normal = Some(face.normal);
            }
        } else {
            t_exit = t_exit.min(t);
        }
        if t_enter > t_exit {
            return None;
        }
    }
    let normal = entry_normal?.div_elem(&scale).normalize();
    Some(RayHit::new(t_enter, normal))
}
