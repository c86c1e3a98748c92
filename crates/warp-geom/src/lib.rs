// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Geometry primitives for Echo collision queries.

This crate provides:
- Deterministic `f32` math (`Vec3`, `Quat`) and an order-preserving float key.
- Axis-aligned bounding boxes (`Aabb`), rigid and scaled transforms, and rays.
- An implicit one-axis interval tree used by collision layers and meshes.
- Collider shapes (`Collider`) with shared blobs and scale/stretch policies.

Design notes:
- Deterministic: no ambient RNG, no fused multiply-add, canonical orders.
- Float32 throughout; operations favor clarity and reproducibility.
- Blobs are immutable once built and shared through `Arc`.
"]
#![forbid(unsafe_code)]

/// One-axis broad-phase structures.
pub mod broad;
mod error;
/// Deterministic math subsystem.
pub mod math;
/// Collider shapes, blobs, and scaling.
pub mod shapes;
/// Foundational geometric types.
pub mod types;

pub use error::GeomError;
pub use math::{Quat, Vec3};
pub use shapes::{Collider, ColliderKind};
pub use types::aabb::Aabb;
pub use types::ray::Ray;
pub use types::transform::{RigidTransform, TransformQvvs};
