// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the collision benchmarks.
#![allow(dead_code)]

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use warp_collide::{ColliderBody, EntityId, JobExecutor, WorkerIndex};
use warp_geom::shapes::{BoxCollider, CapsuleCollider, SphereCollider};
use warp_geom::{Quat, TransformQvvs, Vec3};

/// Runs batches on a dedicated rayon pool; rayon's thread index is the
/// worker index.
pub struct RayonExecutor {
    pool: ThreadPool,
}

impl RayonExecutor {
    pub fn new(threads: usize) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap_or_else(|err| unreachable!("rayon pool: {err}"));
        Self { pool }
    }
}

impl JobExecutor for RayonExecutor {
    fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn map_jobs<R, F>(&self, job_count: usize, job: F) -> Vec<R>
    where
        R: Send,
        F: Fn(WorkerIndex, usize) -> R + Sync,
    {
        self.pool.install(|| {
            (0..job_count)
                .into_par_iter()
                .map(|i| job(WorkerIndex(rayon::current_thread_index().unwrap_or(0)), i))
                .collect()
        })
    }
}

/// Deterministic xorshift64 so every run benches the same scene.
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
}

/// `n` mixed spheres, capsules and boxes scattered over `±extent`.
pub fn scatter_bodies(n: usize, extent: f32, seed: u64) -> Vec<ColliderBody> {
    let mut rng = XorShift64::new(seed);
    (0..n)
        .map(|i| {
            let position = Vec3::new(
                rng.range(-extent, extent),
                rng.range(-extent, extent),
                rng.range(-extent, extent),
            );
            let angle = rng.range(0.0, std::f32::consts::TAU);
            let transform = TransformQvvs::new(
                position,
                Quat::from_axis_angle(Vec3::UNIT_Y, angle),
                1.0,
                Vec3::ONE,
            );
            let size = rng.range(0.25, 2.0);
            let entity = EntityId(i as u64);
            match i % 3 {
                0 => ColliderBody::new(SphereCollider::new(Vec3::ZERO, size), transform, entity),
                1 => ColliderBody::new(
                    CapsuleCollider::new(Vec3::ZERO, Vec3::new(0.0, size * 2.0, 0.0), size * 0.5),
                    transform,
                    entity,
                ),
                _ => ColliderBody::new(BoxCollider::new(Vec3::ZERO, Vec3::splat(size)), transform, entity),
            }
        })
        .collect()
}
