// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scale and stretch application.
//!
//! | Kind | Policy |
//! |------|--------|
//! | Sphere | `StretchCenter`: center × `stretch·scale`, radius × `scale`. `IgnoreStretch`: both × `scale`. |
//! | Capsule | `StretchPoints`: endpoints × `stretch·scale`, radius × `scale`. `IgnoreStretch`: all × `scale`. |
//! | Box | opposite corners × `stretch·scale`, center = midpoint, half = `abs(positive − center)`. |
//! | Triangle | points × `scale·stretch`. |
//! | Convex / mesh / terrain | scale vector × `scale·stretch`. |
//! | Compound | scale and stretch accumulate; children materialize lazily per stretch mode. |

use crate::error::GeomError;
use crate::math::Vec3;
use crate::shapes::{Collider, ColliderKind};

/// Bakes a uniform `scale` and per-axis `stretch` into `collider`.
///
/// Identity (`1`, `(1, 1, 1)`) returns an equal collider.
pub fn apply_scale_stretch(collider: &Collider, scale: f32, stretch: Vec3) -> Collider {
    match collider {
        Collider::Sphere(s) => Collider::Sphere(s.scaled(scale, stretch)),
        Collider::Capsule(c) => Collider::Capsule(c.scaled(scale, stretch)),
        Collider::Box(b) => Collider::Box(b.scaled(scale, stretch)),
        Collider::Triangle(t) => Collider::Triangle(t.scaled(scale, stretch)),
        Collider::Convex(c) => Collider::Convex(c.scaled(scale, stretch)),
        Collider::TriangleMesh(m) => Collider::TriangleMesh(m.scaled(scale, stretch)),
        Collider::Compound(c) => Collider::Compound(c.scaled(scale, stretch)),
        Collider::Terrain(t) => Collider::Terrain(t.scaled(scale, stretch)),
    }
}

/// Like [`apply_scale_stretch`], but spheres, capsules, and compounds reject
/// a stretch whose components differ. A uniform stretch folds into `scale`.
///
/// # Errors
/// [`GeomError::NonUniformScale`] for a non-uniform stretch on those kinds.
pub fn apply_scale_stretch_strict(
    collider: &Collider,
    scale: f32,
    stretch: Vec3,
) -> Result<Collider, GeomError> {
    let kind = collider.kind();
    if !matches!(
        kind,
        ColliderKind::Sphere | ColliderKind::Capsule | ColliderKind::Compound
    ) {
        return Ok(apply_scale_stretch(collider, scale, stretch));
    }
    #[allow(clippy::float_cmp)]
    let uniform = stretch.x() == stretch.y() && stretch.y() == stretch.z();
    if !uniform {
        return Err(GeomError::NonUniformScale { kind });
    }
    Ok(apply_scale_stretch(collider, scale * stretch.x(), Vec3::ONE))
}
