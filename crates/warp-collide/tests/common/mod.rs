// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for warp-collide integration tests.
#![allow(dead_code, clippy::expect_used)]

use std::num::NonZeroUsize;
use std::sync::Arc;

use warp_collide::{ColliderBody, EntityId, ScopedThreadExecutor};
use warp_geom::shapes::{
    BoxCollider, CapsuleCollider, CompoundBlob, CompoundCollider, ConvexBlob, ConvexCollider, SphereCollider,
};
use warp_geom::{Collider, Quat, RigidTransform, TransformQvvs, Vec3};

/// Worker counts every determinism check is run with.
pub const WORKER_COUNTS: [usize; 5] = [1, 2, 3, 4, 8];

pub fn executor(workers: usize) -> ScopedThreadExecutor {
    ScopedThreadExecutor::new(NonZeroUsize::new(workers).expect("non-zero worker count"))
}

/// Deterministic xorshift64; tests never touch ambient randomness.
pub struct XorShift64(u64);

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
        lo + (hi - lo) * unit
    }

    pub fn vec3(&mut self, extent: f32) -> Vec3 {
        Vec3::new(self.range(-extent, extent), self.range(-extent, extent), self.range(-extent, extent))
    }
}

pub fn hull_collider(half: Vec3) -> Collider {
    ConvexCollider::new(Arc::new(ConvexBlob::cuboid(half))).into()
}

pub fn compound_collider() -> Collider {
    let blob = CompoundBlob::new(vec![
        (SphereCollider::new(Vec3::ZERO, 0.5).into(), RigidTransform::from_position(Vec3::new(-1.0, 0.0, 0.0))),
        (BoxCollider::new(Vec3::ZERO, Vec3::splat(0.4)).into(), RigidTransform::from_position(Vec3::new(1.0, 0.0, 0.0))),
    ])
    .expect("compound");
    CompoundCollider::new(Arc::new(blob)).into()
}

/// Mixed bodies scattered over `±extent`, including a few that span grid
/// cells and so land in the cross bucket.
pub fn scatter_bodies(n: usize, extent: f32, seed: u64) -> Vec<ColliderBody> {
    let mut rng = XorShift64::new(seed);
    (0..n)
        .map(|i| {
            let transform = TransformQvvs::new(
                rng.vec3(extent),
                Quat::from_axis_angle(rng.vec3(1.0), rng.range(0.0, std::f32::consts::TAU)),
                rng.range(0.5, 2.0),
                Vec3::ONE,
            );
            let size = rng.range(0.1, 3.0);
            let collider: Collider = match i % 5 {
                0 => SphereCollider::new(Vec3::ZERO, size).into(),
                1 => CapsuleCollider::new(Vec3::ZERO, Vec3::new(0.0, size, 0.0), size * 0.3).into(),
                2 => BoxCollider::new(Vec3::ZERO, Vec3::splat(size)).into(),
                3 => hull_collider(Vec3::new(size, size * 0.5, size)),
                _ => compound_collider(),
            };
            ColliderBody::new(collider, transform, EntityId(i as u64))
        })
        .collect()
}
