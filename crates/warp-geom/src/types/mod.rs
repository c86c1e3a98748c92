// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core geometry types used by the collision engine (AABB, transforms, rays).
//!
//! Determinism notes:
//! - Overlap semantics are inclusive on faces so touching bounds pair up.
//! - Affine math uses `f32` without fused multiply-add to preserve identical
//!   results across platforms.

#[doc = "Axis-aligned bounding boxes (world space)."]
pub mod aabb;
#[doc = "Finite ray segments."]
pub mod ray;
#[doc = "Rigid transforms and scaled body transforms."]
pub mod transform;
