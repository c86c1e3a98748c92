// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layer construction.
//!
//! Phases:
//! 1. bounds and bucket per body, in parallel chunks;
//! 2. counting sort by bucket (serial, stable);
//! 3. per bucket: rank sort by `xmin` and interval tree, in parallel;
//! 4. gather the body arrays in final order.
//!
//! Every parallel phase returns results by job index, so the arrays are
//! bit-identical for any executor and worker count.

use std::num::NonZeroU32;
use std::time::Instant;

use tracing::{debug, instrument, trace, warn};
use warp_geom::broad::interval_tree::{build_nodes, IntervalNode};
use warp_geom::math::f32_order_key;
use warp_geom::Aabb;

use super::{BucketRange, CollisionLayer, CollisionLayerSettings, ColliderBody, SourcedBody};
use crate::append::ParallelAppendBuffer;
use crate::error::CollideError;
use crate::exec::JobExecutor;
use crate::sort::{rank_sort, rank_sort_into, unsigned_key};

/// Bodies per bounds job.
const BOUNDS_CHUNK: usize = 64;

struct BucketOrder {
    sources: Vec<u32>,
    nodes: Vec<IntervalNode>,
}

impl CollisionLayer {
    /// Builds an index over `bodies`; body `i` gets source index `i`.
    ///
    /// # Errors
    /// [`CollideError::InvalidWorldIndex`] when `world_index` is zero;
    /// [`CollideError::InvalidSettings`] when `settings` fail validation or
    /// there are more than `u32::MAX` bodies.
    #[instrument(skip_all, fields(bodies = bodies.len(), world_index = world_index))]
    pub fn build<E: JobExecutor>(
        bodies: Vec<ColliderBody>,
        settings: CollisionLayerSettings,
        world_index: u32,
        executor: &E,
    ) -> Result<Self, CollideError> {
        let world_index = NonZeroU32::new(world_index).ok_or(CollideError::InvalidWorldIndex)?;
        settings.validate()?;
        if u32::try_from(bodies.len()).is_err() {
            return Err(CollideError::InvalidSettings("more than u32::MAX bodies"));
        }

        let t0 = Instant::now();
        let bounds = compute_bounds(&bodies, &settings, executor);
        trace!(elapsed_us = t0.elapsed().as_micros(), "bounds computed");

        let t1 = Instant::now();
        let (bucket_ranges, by_bucket) = bucket_counting_sort(&bounds, &settings);
        trace!(elapsed_us = t1.elapsed().as_micros(), "bucket counting sort");

        let t2 = Instant::now();
        let nan_bucket = settings.nan_bucket() as usize;
        let per_bucket = executor.map_jobs(bucket_ranges.len(), |_, bucket| {
            let members = &by_bucket[bucket_ranges[bucket].indices()];
            sort_bucket(members, &bounds, bucket == nan_bucket)
        });
        trace!(elapsed_us = t2.elapsed().as_micros(), "buckets sorted");

        let n = bodies.len();
        let mut source_indices = Vec::with_capacity(n);
        let mut interval_nodes = Vec::with_capacity(n);
        for order in per_bucket {
            source_indices.extend(order.sources);
            interval_nodes.extend(order.nodes);
        }

        let mut xmin = Vec::with_capacity(n);
        let mut xmax = Vec::with_capacity(n);
        let mut yzminmax = Vec::with_capacity(n);
        for &src in &source_indices {
            let (aabb, _) = bounds[src as usize];
            let (lo, hi) = (aabb.min(), aabb.max());
            xmin.push(lo.x());
            xmax.push(hi.x());
            yzminmax.push([lo.y(), hi.y(), lo.z(), hi.z()]);
        }

        let mut slots: Vec<Option<ColliderBody>> = bodies.into_iter().map(Some).collect();
        let bodies: Vec<ColliderBody> = source_indices
            .iter()
            .filter_map(|&src| slots[src as usize].take())
            .collect();
        debug_assert_eq!(bodies.len(), n);

        let nan_count = bucket_ranges[nan_bucket].count;
        if nan_count > 0 {
            warn!(count = nan_count, "bodies with NaN bounds excluded from queries");
        }
        debug!(
            bodies = n,
            cross = bucket_ranges[settings.cross_bucket() as usize].count,
            occupied_cells = bucket_ranges[..settings.cell_count() as usize]
                .iter()
                .filter(|r| r.count > 0)
                .count(),
            "collision layer built"
        );

        Ok(Self {
            settings,
            world_index,
            bucket_ranges,
            xmin,
            xmax,
            yzminmax,
            interval_nodes,
            source_indices,
            bodies,
        })
    }

    /// Builds from bodies gathered by parallel writers in any interleaving.
    ///
    /// Bodies are ordered by their `source_index` first, so the result is the
    /// same as [`CollisionLayer::build`] on the logical input order.
    ///
    /// # Errors
    /// As [`CollisionLayer::build`], plus [`CollideError::InvalidSettings`]
    /// when the source indices are not exactly `0..n`.
    #[instrument(skip_all, fields(world_index = world_index))]
    pub fn build_from_append_buffer<E: JobExecutor>(
        buffer: ParallelAppendBuffer<SourcedBody>,
        settings: CollisionLayerSettings,
        world_index: u32,
        executor: &E,
    ) -> Result<Self, CollideError> {
        let gathered = buffer.into_vec();
        let keys: Vec<i32> = gathered
            .iter()
            .map(|b| unsigned_key(b.source_index))
            .collect();
        let ranks = rank_sort(&keys);
        for (expected, &r) in ranks.iter().enumerate() {
            if gathered[r as usize].source_index as usize != expected {
                return Err(CollideError::InvalidSettings(
                    "gathered source indices must be a permutation of 0..n",
                ));
            }
        }
        let mut slots: Vec<Option<SourcedBody>> = gathered.into_iter().map(Some).collect();
        let bodies: Vec<ColliderBody> = ranks
            .iter()
            .filter_map(|&r| slots[r as usize].take().map(|s| s.body))
            .collect();
        trace!(bodies = bodies.len(), "gathered bodies ordered");
        Self::build(bodies, settings, world_index, executor)
    }
}

fn compute_bounds<E: JobExecutor>(
    bodies: &[ColliderBody],
    settings: &CollisionLayerSettings,
    executor: &E,
) -> Vec<(Aabb, u32)> {
    let chunks = bodies.len().div_ceil(BOUNDS_CHUNK);
    executor
        .map_jobs(chunks, |_, chunk| {
            let start = chunk * BOUNDS_CHUNK;
            let end = (start + BOUNDS_CHUNK).min(bodies.len());
            bodies[start..end]
                .iter()
                .map(|body| {
                    let aabb = body.aabb();
                    (aabb, settings.bucket_for(&aabb))
                })
                .collect::<Vec<_>>()
        })
        .into_iter()
        .flatten()
        .collect()
}

/// Stable counting sort of body positions by bucket.
fn bucket_counting_sort(
    bounds: &[(Aabb, u32)],
    settings: &CollisionLayerSettings,
) -> (Vec<BucketRange>, Vec<u32>) {
    let mut ranges = vec![BucketRange::default(); settings.bucket_count() as usize];
    for &(_, bucket) in bounds {
        ranges[bucket as usize].count += 1;
    }
    let mut start = 0u32;
    for r in &mut ranges {
        r.start = start;
        start += r.count;
    }
    let mut cursor: Vec<u32> = ranges.iter().map(|r| r.start).collect();
    let mut order = vec![0u32; bounds.len()];
    for (i, &(_, bucket)) in bounds.iter().enumerate() {
        let slot = &mut cursor[bucket as usize];
        order[*slot as usize] = u32::try_from(i).unwrap_or(u32::MAX);
        *slot += 1;
    }
    (ranges, order)
}

fn sort_bucket(members: &[u32], bounds: &[(Aabb, u32)], is_nan: bool) -> BucketOrder {
    if is_nan {
        // NaN keys have no order; keep input order and leave the tree inert.
        return BucketOrder {
            sources: members.to_vec(),
            nodes: vec![IntervalNode::default(); members.len()],
        };
    }
    let keys: Vec<i32> = members
        .iter()
        .map(|&m| f32_order_key(bounds[m as usize].0.min().x()))
        .collect();
    let mut ranks = Vec::new();
    let mut scratch = Vec::new();
    rank_sort_into(&keys, &mut ranks, &mut scratch);
    let sources: Vec<u32> = ranks.iter().map(|&r| members[r as usize]).collect();
    let intervals: Vec<(f32, f32)> = sources
        .iter()
        .map(|&s| {
            let aabb = bounds[s as usize].0;
            (aabb.min().x(), aabb.max().x())
        })
        .collect();
    let mut nodes = vec![IntervalNode::default(); intervals.len()];
    build_nodes(&intervals, &mut nodes);
    BucketOrder { sources, nodes }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::exec::SerialExecutor;
    use crate::layer::EntityId;
    use warp_geom::shapes::SphereCollider;
    use warp_geom::{TransformQvvs, Vec3};

    fn sphere_at(x: f32, y: f32, z: f32, r: f32, id: u64) -> ColliderBody {
        ColliderBody::new(
            SphereCollider::new(Vec3::ZERO, r),
            TransformQvvs::from_position(Vec3::new(x, y, z)),
            EntityId(id),
        )
    }

    #[test]
    fn zero_world_index_is_rejected() {
        let err = CollisionLayer::build(Vec::new(), CollisionLayerSettings::default(), 0, &SerialExecutor);
        assert!(matches!(err, Err(CollideError::InvalidWorldIndex)));
    }

    #[test]
    fn empty_snapshot_builds_an_empty_layer() {
        let layer = CollisionLayer::build(Vec::new(), CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("empty build");
        assert!(layer.is_empty());
        assert_eq!(layer.bucket_ranges().len(), 10);
        assert!(layer.bucket_ranges().iter().all(|r| r.count == 0));
        let q = Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        assert_eq!(layer.find_overlaps(&q).count(), 0);
    }

    #[test]
    fn buckets_are_sorted_by_xmin_and_counts_sum() {
        let bodies = vec![
            sphere_at(300.0, 300.0, 300.0, 1.0, 0),
            sphere_at(100.0, 300.0, 300.0, 1.0, 1),
            sphere_at(0.0, 0.0, 0.0, 1.0, 2),
            sphere_at(200.0, 300.0, 300.0, 1.0, 3),
        ];
        let layer = CollisionLayer::build(bodies, CollisionLayerSettings::default(), 3, &SerialExecutor)
            .expect("build");
        let total: u32 = layer.bucket_ranges().iter().map(|r| r.count).sum();
        assert_eq!(total as usize, layer.len());
        assert_eq!(layer.source_indices(), &[1, 3, 0, 2]);
        assert_eq!(layer.bodies()[0].entity, EntityId(1));
        assert_eq!(layer.bucket_ranges()[7], BucketRange { start: 0, count: 3 });
        assert_eq!(layer.bucket_ranges()[8], BucketRange { start: 3, count: 1 });
        assert_eq!(layer.world_index(), 3);
    }

    #[test]
    fn nan_bodies_are_quarantined() {
        let bodies = vec![
            sphere_at(f32::NAN, 0.0, 0.0, 1.0, 0),
            sphere_at(5.0, 5.0, 5.0, 1.0, 1),
        ];
        let layer = CollisionLayer::build(bodies, CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("build");
        let nan = layer.settings().nan_bucket() as usize;
        assert_eq!(layer.bucket_ranges()[nan].count, 1);
        let everything = Aabb::new(Vec3::splat(-2000.0), Vec3::splat(2000.0));
        let hits: Vec<usize> = layer.find_overlaps(&everything).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(layer.bodies()[hits[0]].entity, EntityId(1));
    }

    #[test]
    fn gathered_build_matches_direct_build() {
        let bodies: Vec<ColliderBody> = (0..20u64)
            .map(|i| sphere_at(i as f32 * 7.0 - 60.0, 1.0, -3.0, 2.0, i))
            .collect();
        let direct = CollisionLayer::build(bodies.clone(), CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("direct");
        let buffer = ParallelAppendBuffer::new(2);
        for (i, body) in bodies.into_iter().enumerate().rev() {
            let mut w = buffer
                .writer(crate::exec::WorkerIndex(i % 2))
                .expect("writer");
            w.write(SourcedBody {
                source_index: u32::try_from(i).expect("index"),
                body,
            });
        }
        let gathered = CollisionLayer::build_from_append_buffer(
            buffer,
            CollisionLayerSettings::default(),
            1,
            &SerialExecutor,
        )
        .expect("gathered");
        assert_eq!(direct.structure_digest(), gathered.structure_digest());
        assert_eq!(direct.bodies(), gathered.bodies());
    }

    #[test]
    fn gathered_build_rejects_duplicate_sources() {
        let buffer = ParallelAppendBuffer::new(1);
        {
            let mut w = buffer.writer(crate::exec::WorkerIndex(0)).expect("writer");
            for _ in 0..2 {
                w.write(SourcedBody {
                    source_index: 0,
                    body: sphere_at(0.0, 0.0, 0.0, 1.0, 0),
                });
            }
        }
        let result = CollisionLayer::build_from_append_buffer(
            buffer,
            CollisionLayerSettings::default(),
            1,
            &SerialExecutor,
        );
        assert!(matches!(result, Err(CollideError::InvalidSettings(_))));
    }
}
