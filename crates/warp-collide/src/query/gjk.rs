// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closest points between convex cores.
//!
//! Every convex primitive is a core (point, segment, box, triangle or hull)
//! inflated by a radius. Core pairs made only of points and segments are
//! solved in closed form. Everything else runs GJK with Johnson's
//! sub-simplex solver, tracking witness points on both shapes; overlapping
//! cores fall through to EPA for depth and normal. Iteration counts are
//! fixed, so results are reproducible bit for bit.

use warp_geom::math::EPSILON;
use warp_geom::shapes::ConvexCollider;
use warp_geom::{Collider, RigidTransform, Vec3};

const MAX_ITERATIONS: usize = 64;
const GJK_RELATIVE_TOLERANCE: f32 = 1e-6;
const TOUCHING_SQUARED: f32 = 1e-12;
const EPA_TOLERANCE: f32 = 1e-5;
const EPA_MAX_VERTICES: usize = 4 + MAX_ITERATIONS;
// A closed triangulated polytope with V vertices has 2V - 4 faces.
const EPA_MAX_FACES: usize = 2 * EPA_MAX_VERTICES - 4;
const EPA_MAX_EDGES: usize = 3 * EPA_MAX_FACES;

/// Shape a radius is swept over.
#[derive(Debug, Clone)]
pub(crate) enum Core<'a> {
    Point(Vec3),
    Segment(Vec3, Vec3),
    Box { center: Vec3, half: Vec3 },
    Triangle([Vec3; 3]),
    Hull(&'a ConvexCollider),
}

impl Core<'_> {
    fn support(&self, d: &Vec3) -> Vec3 {
        match self {
            Self::Point(p) => *p,
            Self::Segment(a, b) => {
                if b.dot(d) > a.dot(d) {
                    *b
                } else {
                    *a
                }
            }
            Self::Box { center, half } => {
                let pick = |i: usize| {
                    if d.component(i) >= 0.0 {
                        half.component(i)
                    } else {
                        -half.component(i)
                    }
                };
                *center + Vec3::new(pick(0), pick(1), pick(2))
            }
            Self::Triangle(points) => {
                let mut best = points[0];
                for p in &points[1..] {
                    if p.dot(d) > best.dot(d) {
                        best = *p;
                    }
                }
                best
            }
            Self::Hull(hull) => hull.support(d),
        }
    }

    fn center(&self) -> Vec3 {
        match self {
            Self::Point(p) => *p,
            Self::Segment(a, b) => (*a + *b) * 0.5,
            Self::Box { center, .. } => *center,
            Self::Triangle([a, b, c]) => (*a + *b + *c) / 3.0,
            Self::Hull(hull) => hull.local_aabb().center(),
        }
    }
}

/// Core and radius of a convex collider; `None` for composites.
pub(crate) fn decompose(collider: &Collider) -> Option<(Core<'_>, f32)> {
    match collider {
        Collider::Sphere(s) => Some((Core::Point(s.center), s.radius)),
        Collider::Capsule(c) => Some((Core::Segment(c.point_a, c.point_b), c.radius)),
        Collider::Box(b) => Some((
            Core::Box {
                center: b.center,
                half: b.half_size,
            },
            0.0,
        )),
        Collider::Triangle(t) => Some((Core::Triangle(t.points), 0.0)),
        Collider::Convex(c) => Some((Core::Hull(c), 0.0)),
        Collider::TriangleMesh(_) | Collider::Compound(_) | Collider::Terrain(_) => None,
    }
}

/// A core placed in a shared frame.
#[derive(Debug, Clone)]
pub(crate) struct Placed<'a> {
    pub core: Core<'a>,
    pub frame: RigidTransform,
}

impl Placed<'_> {
    fn support(&self, d: &Vec3) -> Vec3 {
        let local = self.frame.inverse_transform_direction(d);
        self.frame.transform_point(&self.core.support(&local))
    }

    fn center(&self) -> Vec3 {
        self.frame.transform_point(&self.core.center())
    }

    /// Point or segment endpoints in the shared frame.
    fn as_segment(&self) -> Option<(Vec3, Vec3)> {
        match &self.core {
            Core::Point(p) => {
                let p = self.frame.transform_point(p);
                Some((p, p))
            }
            Core::Segment(a, b) => Some((self.frame.transform_point(a), self.frame.transform_point(b))),
            _ => None,
        }
    }
}

/// Closest features of two cores.
///
/// `normal` is a unit vector pointing from A toward B. `separation` is the
/// gap between the cores, negative when they overlap.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct CoreContact {
    pub point_a: Vec3,
    pub point_b: Vec3,
    pub normal: Vec3,
    pub separation: f32,
}

/// Closest points or penetration between two placed cores.
pub(crate) fn core_contact(a: &Placed<'_>, b: &Placed<'_>) -> CoreContact {
    if let (Some((p1, q1)), Some((p2, q2))) = (a.as_segment(), b.as_segment()) {
        return segment_contact(p1, q1, p2, q2, a.center(), b.center());
    }
    gjk(a, b)
}

fn fallback_normal(a_center: Vec3, b_center: Vec3) -> Vec3 {
    (b_center - a_center).normalize_or(Vec3::UNIT_Y)
}

/// Closest points between segments `p1..q1` and `p2..q2`.
pub(crate) fn closest_segment_points(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);
    let eps = EPSILON * EPSILON;
    let (s, t) = if a <= eps && e <= eps {
        (0.0, 0.0)
    } else if a <= eps {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= eps {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom > eps { ((b * f - c * e) / denom).clamp(0.0, 1.0) } else { 0.0 };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

fn segment_contact(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3, a_center: Vec3, b_center: Vec3) -> CoreContact {
    let (c1, c2) = closest_segment_points(p1, q1, p2, q2);
    let gap = c2 - c1;
    let separation = gap.length();
    let normal = if separation > EPSILON {
        gap / separation
    } else {
        (q1 - p1)
            .cross(&(q2 - p2))
            .normalize_or(fallback_normal(a_center, b_center))
    };
    CoreContact {
        point_a: c1,
        point_b: c2,
        normal,
        separation,
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Vertex {
    w: Vec3,
    a: Vec3,
    b: Vec3,
}

fn minkowski_support(a: &Placed<'_>, b: &Placed<'_>, d: &Vec3) -> Vertex {
    let pa = a.support(d);
    let pb = b.support(&-*d);
    Vertex { w: pa - pb, a: pa, b: pb }
}

/// Active simplex with barycentric weights of its closest point to the origin.
#[derive(Debug, Copy, Clone, Default)]
struct Simplex {
    verts: [Vertex; 4],
    bary: [f32; 4],
    len: usize,
}

impl Simplex {
    fn from_weighted(items: &[(Vertex, f32)]) -> Self {
        let mut s = Self::default();
        for (i, &(v, weight)) in items.iter().enumerate() {
            s.verts[i] = v;
            s.bary[i] = weight;
        }
        s.len = items.len();
        s
    }

    fn closest(&self) -> Vec3 {
        (0..self.len).fold(Vec3::ZERO, |acc, i| acc + self.verts[i].w * self.bary[i])
    }

    fn witnesses(&self) -> (Vec3, Vec3) {
        (0..self.len).fold((Vec3::ZERO, Vec3::ZERO), |(pa, pb), i| {
            (pa + self.verts[i].a * self.bary[i], pb + self.verts[i].b * self.bary[i])
        })
    }

    fn contains(&self, w: &Vec3) -> bool {
        self.verts[..self.len]
            .iter()
            .any(|v| v.w.distance(w) <= EPSILON)
    }

    fn push(&mut self, v: Vertex) {
        debug_assert!(self.len < 4);
        self.verts[self.len] = v;
        self.len += 1;
    }
}

fn closest_on_segment(a: Vertex, b: Vertex) -> Simplex {
    let ab = b.w - a.w;
    let denom = ab.dot(&ab);
    if denom <= EPSILON * EPSILON {
        return Simplex::from_weighted(&[(a, 1.0)]);
    }
    let t = -a.w.dot(&ab) / denom;
    if t <= 0.0 {
        Simplex::from_weighted(&[(a, 1.0)])
    } else if t >= 1.0 {
        Simplex::from_weighted(&[(b, 1.0)])
    } else {
        Simplex::from_weighted(&[(a, 1.0 - t), (b, t)])
    }
}

fn closest_on_triangle(a: Vertex, b: Vertex, c: Vertex) -> Simplex {
    let ab = b.w - a.w;
    let ac = c.w - a.w;
    let ap = -a.w;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Simplex::from_weighted(&[(a, 1.0)]);
    }
    let bp = -b.w;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Simplex::from_weighted(&[(b, 1.0)]);
    }
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Simplex::from_weighted(&[(a, 1.0 - v), (b, v)]);
    }
    let cp = -c.w;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Simplex::from_weighted(&[(c, 1.0)]);
    }
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return Simplex::from_weighted(&[(a, 1.0 - w), (c, w)]);
    }
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Simplex::from_weighted(&[(b, 1.0 - w), (c, w)]);
    }
    let sum = va + vb + vc;
    if sum.abs() <= f32::MIN_POSITIVE {
        // Flat triangle: best of its edges.
        return [closest_on_segment(a, b), closest_on_segment(b, c), closest_on_segment(a, c)]
            .into_iter()
            .min_by(|x, y| x.closest().length_squared().total_cmp(&y.closest().length_squared()))
            .unwrap_or_else(|| Simplex::from_weighted(&[(a, 1.0)]));
    }
    let v = vb / sum;
    let w = vc / sum;
    Simplex::from_weighted(&[(a, 1.0 - v - w), (b, v), (c, w)])
}

/// `None` when the origin is inside the tetrahedron.
fn closest_on_tetrahedron(s: &Simplex) -> Option<Simplex> {
    let [a, b, c, d] = s.verts;
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];
    let mut best: Option<(f32, Simplex)> = None;
    for (p, q, r, opposite) in faces {
        let n = (q.w - p.w).cross(&(r.w - p.w));
        let side_origin = (-p.w).dot(&n);
        let side_opposite = (opposite.w - p.w).dot(&n);
        let outside = side_opposite.abs() <= EPSILON * EPSILON || side_origin * side_opposite < 0.0;
        if !outside {
            continue;
        }
        let candidate = closest_on_triangle(p, q, r);
        let dist = candidate.closest().length_squared();
        if best.as_ref().is_none_or(|(d, _)| dist < *d) {
            best = Some((dist, candidate));
        }
    }
    best.map(|(_, s)| s)
}

fn solve(s: &Simplex) -> Option<Simplex> {
    match s.len {
        1 => Some(Simplex::from_weighted(&[(s.verts[0], 1.0)])),
        2 => Some(closest_on_segment(s.verts[0], s.verts[1])),
        3 => Some(closest_on_triangle(s.verts[0], s.verts[1], s.verts[2])),
        _ => closest_on_tetrahedron(s),
    }
}

fn gjk(a: &Placed<'_>, b: &Placed<'_>) -> CoreContact {
    let start_dir = (b.center() - a.center()).normalize_or(Vec3::UNIT_X);
    let first = minkowski_support(a, b, &-start_dir);
    let mut simplex = Simplex::from_weighted(&[(first, 1.0)]);
    let mut v = first.w;

    for _ in 0..MAX_ITERATIONS {
        let vv = v.dot(&v);
        if vv <= TOUCHING_SQUARED {
            return penetration(a, b, &simplex);
        }
        let w = minkowski_support(a, b, &-v);
        if vv - v.dot(&w.w) <= GJK_RELATIVE_TOLERANCE * vv || simplex.contains(&w.w) {
            break;
        }
        let mut grown = simplex;
        grown.push(w);
        match solve(&grown) {
            Some(next) => {
                simplex = next;
                v = simplex.closest();
            }
            None => return penetration(a, b, &grown),
        }
    }

    let (pa, pb) = simplex.witnesses();
    let gap = pb - pa;
    let separation = gap.length();
    if separation <= EPSILON {
        return penetration(a, b, &simplex);
    }
    CoreContact {
        point_a: pa,
        point_b: pb,
        normal: gap / separation,
        separation,
    }
}

/// Fixed-capacity list on the stack; `push` reports `false` when full.
#[derive(Debug, Copy, Clone)]
struct StackVec<T: Copy, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Copy, const N: usize> StackVec<T, N> {
    fn filled(fill: T) -> Self {
        Self { items: [fill; N], len: 0 }
    }

    fn push(&mut self, item: T) -> bool {
        if self.len == N {
            return false;
        }
        self.items[self.len] = item;
        self.len += 1;
        true
    }

    fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    fn swap_remove(&mut self, index: usize) {
        self.len -= 1;
        self.items[index] = self.items[self.len];
    }
}

/// Grows a simplex that encloses the origin into a tetrahedron.
fn complete_tetrahedron(a: &Placed<'_>, b: &Placed<'_>, s: &Simplex) -> Option<[Vertex; 4]> {
    let mut verts = StackVec::<Vertex, 4>::filled(Vertex::default());
    for v in &s.verts[..s.len] {
        verts.push(*v);
    }
    let axes = [Vec3::UNIT_X, Vec3::UNIT_Y, Vec3::UNIT_Z];
    if verts.len == 1 {
        for dir in axes.iter().flat_map(|d| [*d, -*d]) {
            let v = minkowski_support(a, b, &dir);
            if v.w.distance(&verts.items[0].w) > EPSILON {
                verts.push(v);
                break;
            }
        }
    }
    if verts.len == 2 {
        let line = verts.items[1].w - verts.items[0].w;
        let u = line.any_orthogonal();
        let t = line.cross(&u).normalize();
        for dir in [u, -u, t, -t] {
            let v = minkowski_support(a, b, &dir);
            let off = (v.w - verts.items[0].w).cross(&line);
            if off.length() > EPSILON * line.length() {
                verts.push(v);
                break;
            }
        }
    }
    if verts.len == 3 {
        let [v0, v1, v2, _] = verts.items;
        let n = (v1.w - v0.w).cross(&(v2.w - v0.w)).normalize();
        for dir in [n, -n] {
            let v = minkowski_support(a, b, &dir);
            if (v.w - v0.w).dot(&n).abs() > EPSILON {
                verts.push(v);
                break;
            }
        }
    }
    (verts.len == 4).then_some(verts.items)
}

fn penetration(a: &Placed<'_>, b: &Placed<'_>, s: &Simplex) -> CoreContact {
    let fallback = || {
        let (pa, pb) = s.witnesses();
        CoreContact {
            point_a: pa,
            point_b: pb,
            normal: fallback_normal(a.center(), b.center()),
            separation: 0.0,
        }
    };
    let Some(tetra) = complete_tetrahedron(a, b, s) else {
        return fallback();
    };
    epa(a, b, tetra).unwrap_or_else(fallback)
}

#[derive(Debug, Copy, Clone)]
struct EpaFace {
    indices: [usize; 3],
    normal: Vec3,
    distance: f32,
}

const EMPTY_FACE: EpaFace = EpaFace {
    indices: [0; 3],
    normal: Vec3::ZERO,
    distance: f32::INFINITY,
};

fn make_face(vertices: &[Vertex], i: usize, j: usize, k: usize) -> EpaFace {
    let n = (vertices[j].w - vertices[i].w).cross(&(vertices[k].w - vertices[i].w));
    let len = n.length();
    if len <= EPSILON * EPSILON {
        return EpaFace {
            indices: [i, j, k],
            normal: Vec3::ZERO,
            distance: f32::INFINITY,
        };
    }
    let normal = n / len;
    EpaFace {
        indices: [i, j, k],
        normal,
        distance: normal.dot(&vertices[i].w),
    }
}

/// Barycentric coordinates of `p` in triangle `abc`.
fn barycentric(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> [f32; 3] {
    let v0 = *b - *a;
    let v1 = *c - *a;
    let v2 = *p - *a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::MIN_POSITIVE {
        return [1.0 / 3.0; 3];
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    [1.0 - v - w, v, w]
}

/// Expanding polytope over a tetrahedron enclosing the origin.
///
/// The polytope lives in fixed stack storage. When it would outgrow that
/// storage the closest face found so far is returned.
fn epa(a: &Placed<'_>, b: &Placed<'_>, mut tetra: [Vertex; 4]) -> Option<CoreContact> {
    let orientation = (tetra[1].w - tetra[0].w)
        .cross(&(tetra[2].w - tetra[0].w))
        .dot(&(tetra[3].w - tetra[0].w));
    if orientation > 0.0 {
        tetra.swap(1, 2);
    }
    let mut vertices = StackVec::<Vertex, EPA_MAX_VERTICES>::filled(tetra[0]);
    for v in tetra {
        vertices.push(v);
    }
    let mut faces = StackVec::<EpaFace, EPA_MAX_FACES>::filled(EMPTY_FACE);
    for [i, j, k] in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
        faces.push(make_face(vertices.as_slice(), i, j, k));
    }
    let mut horizon = StackVec::<(usize, usize), EPA_MAX_EDGES>::filled((0, 0));

    let mut closest = faces.items[0];
    for _ in 0..MAX_ITERATIONS {
        closest = *faces
            .as_slice()
            .iter()
            .min_by(|x, y| x.distance.total_cmp(&y.distance))?;
        if !closest.distance.is_finite() {
            return None;
        }
        let support = minkowski_support(a, b, &closest.normal);
        let reach = support.w.dot(&closest.normal);
        if reach - closest.distance <= EPA_TOLERANCE {
            break;
        }

        // Boundary of the faces the new vertex can see; shared edges cancel.
        horizon.len = 0;
        let mut visible_count = 0;
        let mut overflow = false;
        for face in faces.as_slice() {
            if !sees(face, &vertices, &support) {
                continue;
            }
            visible_count += 1;
            for e in 0..3 {
                let edge = (face.indices[e], face.indices[(e + 1) % 3]);
                if let Some(pos) = horizon.as_slice().iter().position(|&h| h == (edge.1, edge.0)) {
                    horizon.swap_remove(pos);
                } else if !horizon.push(edge) {
                    overflow = true;
                }
            }
        }
        if horizon.len == 0 {
            break;
        }
        let new_index = vertices.len;
        if overflow || faces.len - visible_count + horizon.len > EPA_MAX_FACES || !vertices.push(support) {
            break;
        }

        let mut f = 0;
        while f < faces.len {
            if sees(&faces.items[f], &vertices, &support) {
                faces.swap_remove(f);
            } else {
                f += 1;
            }
        }
        for &(i, j) in horizon.as_slice() {
            faces.push(make_face(vertices.as_slice(), i, j, new_index));
        }
    }

    let [i, j, k] = closest.indices;
    let (va, vb, vc) = (vertices.items[i], vertices.items[j], vertices.items[k]);
    let projected = closest.normal * closest.distance;
    let [u, v, w] = barycentric(&projected, &va.w, &vb.w, &vc.w);
    let point_a = va.a * u + vb.a * v + vc.a * w;
    let point_b = va.b * u + vb.b * v + vc.b * w;
    Some(CoreContact {
        point_a,
        point_b,
        normal: closest.normal,
        separation: -closest.distance,
    })
}

fn sees(face: &EpaFace, vertices: &StackVec<Vertex, EPA_MAX_VERTICES>, support: &Vertex) -> bool {
    face.normal.dot(&(support.w - vertices.items[face.indices[0]].w)) > EPSILON
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warp_geom::shapes::ConvexBlob;

    fn placed(core: Core<'_>, at: Vec3) -> Placed<'_> {
        Placed {
            core,
            frame: RigidTransform::from_position(at),
        }
    }

    #[test]
    fn separated_boxes_report_gap_and_witnesses() {
        let a = placed(Core::Box { center: Vec3::ZERO, half: Vec3::ONE }, Vec3::ZERO);
        let b = placed(Core::Box { center: Vec3::ZERO, half: Vec3::ONE }, Vec3::new(5.0, 0.5, 0.0));
        let c = core_contact(&a, &b);
        assert!((c.separation - 3.0).abs() < 1e-4);
        assert!(c.normal.distance(&Vec3::UNIT_X) < 1e-4);
        assert!((c.point_a.x() - 1.0).abs() < 1e-4);
        assert!((c.point_b.x() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn overlapping_boxes_report_depth_along_shallowest_axis() {
        let a = placed(Core::Box { center: Vec3::ZERO, half: Vec3::ONE }, Vec3::ZERO);
        let b = placed(Core::Box { center: Vec3::ZERO, half: Vec3::ONE }, Vec3::new(1.5, 0.2, 0.1));
        let c = core_contact(&a, &b);
        assert!((c.separation + 0.5).abs() < 1e-3);
        assert!(c.normal.distance(&Vec3::UNIT_X) < 1e-3);
    }

    #[test]
    fn point_against_hull_matches_box() {
        let hull = ConvexCollider::new(Arc::new(ConvexBlob::cuboid(Vec3::ONE)));
        let a = placed(Core::Point(Vec3::ZERO), Vec3::new(0.3, 4.0, -0.2));
        let b = placed(Core::Hull(&hull), Vec3::ZERO);
        let c = core_contact(&a, &b);
        assert!((c.separation - 3.0).abs() < 1e-4);
        assert!(c.normal.distance(&-Vec3::UNIT_Y) < 1e-4);
        assert!(c.point_b.distance(&Vec3::new(0.3, 1.0, -0.2)) < 1e-4);
    }

    #[test]
    fn crossing_segments_have_zero_separation() {
        let (c1, c2) = closest_segment_points(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        );
        assert!(c1.distance(&Vec3::ZERO) < 1e-6);
        assert!(c2.distance(&Vec3::new(0.0, 0.0, 2.0)) < 1e-6);
    }
}
