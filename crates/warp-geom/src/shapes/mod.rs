// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collider shapes.
//!
//! [`Collider`] is a closed tagged union; every query matches on it directly.
//! Convex, mesh, terrain, and compound variants reference immutable blobs
//! through [`std::sync::Arc`], so many colliders can share one payload.

pub mod compound;
pub mod convex;
pub mod mesh;
pub mod primitives;
pub mod scale;
pub mod terrain;

use crate::types::aabb::Aabb;
use crate::types::transform::TransformQvvs;

pub use compound::{CompoundBlob, CompoundChild, CompoundCollider, CompoundStretchMode};
pub use convex::{ConvexBlob, ConvexCollider, ConvexFace};
pub use mesh::{TriMeshBlob, TriMeshCollider};
pub use primitives::{
    BoxCollider, CapsuleCollider, CapsuleStretchMode, SphereCollider, SphereStretchMode,
    TriangleCollider,
};
pub use scale::{apply_scale_stretch, apply_scale_stretch_strict};
pub use terrain::{TerrainBlob, TerrainCollider, TerrainPatch};

/// Discriminant of [`Collider`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ColliderKind {
    /// [`SphereCollider`].
    Sphere = 0,
    /// [`CapsuleCollider`].
    Capsule = 1,
    /// [`BoxCollider`].
    Box = 2,
    /// [`TriangleCollider`].
    Triangle = 3,
    /// [`ConvexCollider`].
    Convex = 4,
    /// [`TriMeshCollider`].
    TriangleMesh = 5,
    /// [`CompoundCollider`].
    Compound = 6,
    /// [`TerrainCollider`].
    Terrain = 7,
}

impl ColliderKind {
    /// Every kind, in discriminant order.
    pub const ALL: [Self; 8] = [
        Self::Sphere,
        Self::Capsule,
        Self::Box,
        Self::Triangle,
        Self::Convex,
        Self::TriangleMesh,
        Self::Compound,
        Self::Terrain,
    ];

    /// Wire tag.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Kind for a wire tag.
    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// `true` for kinds made of several sub-shapes (mesh, compound, terrain).
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::TriangleMesh | Self::Compound | Self::Terrain)
    }
}

/// Any collider shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Collider {
    /// Sphere.
    Sphere(SphereCollider),
    /// Capsule.
    Capsule(CapsuleCollider),
    /// Box.
    Box(BoxCollider),
    /// Triangle.
    Triangle(TriangleCollider),
    /// Convex hull.
    Convex(ConvexCollider),
    /// Triangle mesh.
    TriangleMesh(TriMeshCollider),
    /// Compound of primitive and convex children.
    Compound(CompoundCollider),
    /// Height-field terrain.
    Terrain(TerrainCollider),
}

impl Collider {
    /// Variant discriminant.
    pub fn kind(&self) -> ColliderKind {
        match self {
            Self::Sphere(_) => ColliderKind::Sphere,
            Self::Capsule(_) => ColliderKind::Capsule,
            Self::Box(_) => ColliderKind::Box,
            Self::Triangle(_) => ColliderKind::Triangle,
            Self::Convex(_) => ColliderKind::Convex,
            Self::TriangleMesh(_) => ColliderKind::TriangleMesh,
            Self::Compound(_) => ColliderKind::Compound,
            Self::Terrain(_) => ColliderKind::Terrain,
        }
    }

    /// See [`apply_scale_stretch`].
    pub fn scaled(&self, scale: f32, stretch: crate::math::Vec3) -> Self {
        apply_scale_stretch(self, scale, stretch)
    }

    /// Bounds in the collider's own (already scaled) space.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Self::Sphere(s) => s.local_aabb(),
            Self::Capsule(c) => c.local_aabb(),
            Self::Box(b) => b.local_aabb(),
            Self::Triangle(t) => t.local_aabb(),
            Self::Convex(c) => c.local_aabb(),
            Self::TriangleMesh(m) => m.local_aabb(),
            Self::Compound(c) => c.local_aabb(),
            Self::Terrain(t) => t.local_aabb(),
        }
    }

    /// World bounds under `transform`, including its scale and stretch.
    pub fn aabb(&self, transform: &TransformQvvs) -> Aabb {
        self.scaled(transform.scale(), transform.stretch())
            .local_aabb()
            .rotated_translated(&transform.rotation(), &transform.position())
    }
}

impl From<SphereCollider> for Collider {
    fn from(value: SphereCollider) -> Self {
        Self::Sphere(value)
    }
}

impl From<CapsuleCollider> for Collider {
    fn from(value: CapsuleCollider) -> Self {
        Self::Capsule(value)
    }
}

impl From<BoxCollider> for Collider {
    fn from(value: BoxCollider) -> Self {
        Self::Box(value)
    }
}

impl From<TriangleCollider> for Collider {
    fn from(value: TriangleCollider) -> Self {
        Self::Triangle(value)
    }
}

impl From<ConvexCollider> for Collider {
    fn from(value: ConvexCollider) -> Self {
        Self::Convex(value)
    }
}

impl From<TriMeshCollider> for Collider {
    fn from(value: TriMeshCollider) -> Self {
        Self::TriangleMesh(value)
    }
}

impl From<CompoundCollider> for Collider {
    fn from(value: CompoundCollider) -> Self {
        Self::Compound(value)
    }
}

impl From<TerrainCollider> for Collider {
    fn from(value: TerrainCollider) -> Self {
        Self::Terrain(value)
    }
}
