// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compound colliders: primitive or convex children placed inside one shape.
//!
//! Scale and stretch accumulate on the instance; children are materialized
//! on demand under the instance's [`CompoundStretchMode`].

use std::sync::Arc;

use crate::error::GeomError;
use crate::math::Vec3;
use crate::shapes::Collider;
use crate::types::aabb::Aabb;
use crate::types::transform::RigidTransform;

/// How a compound distributes its accumulated stretch over its children.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompoundStretchMode {
    /// Child positions move with `stretch * scale`; each child shape is
    /// stretched along its own axes by how much the compound stretch lengthens
    /// that axis.
    #[default]
    RotateStretchLocally,
    /// Positions and shapes follow `scale` only.
    IgnoreStretch,
    /// Positions move with `stretch * scale`; shapes follow `scale` only.
    StretchPositionsOnly,
}

/// One child of a compound: a primitive or convex collider and its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundChild {
    /// Child shape in its own local space.
    pub collider: Collider,
    /// Placement inside the compound.
    pub transform: RigidTransform,
}

/// Immutable list of compound children shared between colliders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundBlob {
    children: Vec<CompoundChild>,
}

impl CompoundBlob {
    /// Builds a compound from `(collider, placement)` pairs.
    ///
    /// # Errors
    /// [`GeomError::InvalidBlob`] when `children` is empty or contains a
    /// compound, triangle mesh, or terrain collider.
    pub fn new(children: Vec<(Collider, RigidTransform)>) -> Result<Self, GeomError> {
        if children.is_empty() {
            return Err(GeomError::InvalidBlob("compound needs at least one child"));
        }
        if children.iter().any(|(c, _)| c.kind().is_composite()) {
            return Err(GeomError::InvalidBlob(
                "compound children must be primitive or convex colliders",
            ));
        }
        u32::try_from(children.len())
            .map_err(|_| GeomError::InvalidBlob("too many compound children"))?;
        Ok(Self {
            children: children
                .into_iter()
                .map(|(collider, transform)| CompoundChild { collider, transform })
                .collect(),
        })
    }

    /// Unscaled children.
    pub fn children(&self) -> &[CompoundChild] {
        &self.children
    }
}

/// Compound instance with accumulated scale and stretch.
///
/// Children are never stored scaled; [`CompoundCollider::child`] materializes
/// one on demand from the shared blob.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundCollider {
    /// Shared children.
    pub blob: Arc<CompoundBlob>,
    /// Accumulated uniform scale.
    pub scale: f32,
    /// Accumulated stretch.
    pub stretch: Vec3,
    /// Stretch policy.
    pub stretch_mode: CompoundStretchMode,
}

impl CompoundCollider {
    /// Unscaled instance of `blob` with the default stretch policy.
    pub fn new(blob: Arc<CompoundBlob>) -> Self {
        Self {
            blob,
            scale: 1.0,
            stretch: Vec3::ONE,
            stretch_mode: CompoundStretchMode::RotateStretchLocally,
        }
    }

    /// Same compound with `mode` as its stretch policy.
    pub fn with_stretch_mode(mut self, mode: CompoundStretchMode) -> Self {
        self.stretch_mode = mode;
        self
    }

    /// Accumulates `scale` and `stretch`.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        Self {
            blob: Arc::clone(&self.blob),
            scale: self.scale * scale,
            stretch: self.stretch.mul_elem(&stretch),
            stretch_mode: self.stretch_mode,
        }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.blob.children.len()
    }

    /// `true` when the compound has no children (never, for a valid blob).
    pub fn is_empty(&self) -> bool {
        self.blob.children.is_empty()
    }

    /// Child `index` with this compound's scale and stretch applied, placed in
    /// compound-local space.
    pub fn child(&self, index: usize) -> Option<(Collider, RigidTransform)> {
        let child = self.blob.children.get(index)?;
        let local = child.transform;
        let (position, shape) = match self.stretch_mode {
            CompoundStretchMode::RotateStretchLocally => {
                let local_stretch = if self.stretch == Vec3::ONE {
                    Vec3::ONE
                } else {
                    let [bx, by, bz] = local.rotation().basis();
                    Vec3::new(
                        axis_stretch(&bx, &self.stretch),
                        axis_stretch(&by, &self.stretch),
                        axis_stretch(&bz, &self.stretch),
                    )
                };
                (
                    local.position().mul_elem(&self.stretch) * self.scale,
                    child.collider.scaled(self.scale, local_stretch),
                )
            }
            CompoundStretchMode::IgnoreStretch => (
                local.position() * self.scale,
                child.collider.scaled(self.scale, Vec3::ONE),
            ),
            CompoundStretchMode::StretchPositionsOnly => (
                local.position().mul_elem(&self.stretch) * self.scale,
                child.collider.scaled(self.scale, Vec3::ONE),
            ),
        };
        Some((shape, RigidTransform::new(local.rotation(), position)))
    }

    /// Iterator over materialized children in blob order.
    pub fn children(&self) -> impl Iterator<Item = (Collider, RigidTransform)> + '_ {
        (0..self.len()).filter_map(move |i| self.child(i))
    }

    /// Compound-local bounds (union of child bounds).
    pub fn local_aabb(&self) -> Aabb {
        self.children()
            .map(|(shape, placement)| {
                shape
                    .local_aabb()
                    .rotated_translated(&placement.rotation(), &placement.position())
            })
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO))
    }
}

/// Stretch seen along the rotated child axis `axis`: the length the compound
/// stretch gives it, negative when the stretched axis points backwards.
fn axis_stretch(axis: &Vec3, stretch: &Vec3) -> f32 {
    let stretched = axis.mul_elem(stretch);
    let length = stretched.length();
    if stretched.dot(axis) < 0.0 {
        -length
    } else {
        length
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::math::Quat;
    use crate::shapes::primitives::SphereCollider;
    use crate::types::transform::TransformQvvs;
    use core::f32::consts::FRAC_PI_2;

    fn pair() -> Arc<CompoundBlob> {
        Arc::new(
            CompoundBlob::new(vec![
                (
                    Collider::Sphere(SphereCollider::new(Vec3::ZERO, 1.0)),
                    RigidTransform::from_position(Vec3::new(2.0, 0.0, 0.0)),
                ),
                (
                    Collider::Sphere(SphereCollider::new(Vec3::UNIT_X, 0.5)),
                    RigidTransform::new(
                        Quat::from_axis_angle(Vec3::UNIT_Z, FRAC_PI_2),
                        Vec3::ZERO,
                    ),
                ),
            ])
            .expect("valid compound"),
        )
    }

    #[test]
    fn stretch_modes_move_positions() {
        let stretch = Vec3::new(3.0, 1.0, 1.0);
        let c = CompoundCollider::new(pair()).scaled(2.0, stretch);
        let (_, t) = c.child(0).expect("child");
        assert_eq!(t.position(), Vec3::new(12.0, 0.0, 0.0));
        let ignore = c.clone().with_stretch_mode(CompoundStretchMode::IgnoreStretch);
        let (_, t) = ignore.child(0).expect("child");
        assert_eq!(t.position(), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn rotate_stretch_locally_reexpresses_axis() {
        let c = CompoundCollider::new(pair()).scaled(1.0, Vec3::new(1.0, 4.0, 1.0));
        let (shape, _) = c.child(1).expect("child");
        let Collider::Sphere(s) = shape else {
            unreachable!("child 1 is a sphere");
        };
        // Child frame is rotated 90° about Z, so world Y stretch lands on local X.
        assert!((s.center.x() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn mirrored_compound_matches_standalone_child() {
        let sphere = Collider::Sphere(SphereCollider::new(Vec3::UNIT_X, 0.25));
        let rotated = RigidTransform::new(Quat::from_axis_angle(Vec3::UNIT_Y, FRAC_PI_2), Vec3::ZERO);
        let mirror = TransformQvvs::new(Vec3::ZERO, Quat::identity(), 1.0, Vec3::new(-1.0, 1.0, 1.0));
        for placement in [RigidTransform::identity(), rotated] {
            let blob = CompoundBlob::new(vec![(sphere.clone(), placement)]).expect("valid compound");
            let wrapped = Collider::Compound(CompoundCollider::new(Arc::new(blob)));
            let center = placement.transform_point(&Vec3::UNIT_X);
            let alone = Collider::Sphere(SphereCollider::new(center, 0.25)).aabb(&mirror);
            let got = wrapped.aabb(&mirror);
            assert!(got.min().distance(&alone.min()) < 1e-5, "{got:?} vs {alone:?}");
            assert!(got.max().distance(&alone.max()) < 1e-5, "{got:?} vs {alone:?}");
        }
        let blob = CompoundBlob::new(vec![(sphere, RigidTransform::identity())]).expect("valid compound");
        let got = Collider::Compound(CompoundCollider::new(Arc::new(blob))).aabb(&mirror);
        assert!((got.min().x() + 1.25).abs() < 1e-5);
        assert!((got.max().x() + 0.75).abs() < 1e-5);
    }

    #[test]
    fn rejects_nested_compound() {
        let inner = Collider::Compound(CompoundCollider::new(pair()));
        assert!(CompoundBlob::new(vec![(inner, RigidTransform::identity())]).is_err());
    }
}
