// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounds-overlap pair search.
//!
//! One job per grid cell sweeps the cell against itself and against the
//! cross bucket; one more job sweeps the cross bucket against itself. Two
//! bodies in different cells cannot overlap, so this covers every pair.
//! Jobs append into a [`ParallelAppendBuffer`]; the result is then put in
//! canonical `(a, b)` order with two stable rank sorts, so it does not depend
//! on which worker found what.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, instrument};

use super::CollisionLayer;
use crate::append::{AppendWriter, ParallelAppendBuffer};
use crate::error::CollideError;
use crate::exec::{JobExecutor, WorkerIndex};
use crate::sort::{rank_sort_into, unsigned_key};

/// Two body indices whose bounds overlap.
///
/// For a self search `a < b`. For a search between two layers `a` indexes
/// the first layer and `b` the second.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Pod, Zeroable)]
pub struct BodyPair {
    /// Body index in the first layer.
    pub a: u32,
    /// Body index in the second layer.
    pub b: u32,
}

#[derive(Clone)]
struct Side<'a> {
    layer: &'a CollisionLayer,
    range: Range<usize>,
}

impl<'a> Side<'a> {
    fn bucket(layer: &'a CollisionLayer, bucket: usize) -> Self {
        Self {
            layer,
            range: layer.bucket_ranges[bucket].indices(),
        }
    }

    fn overlaps(&self, i: usize, other: &Self, j: usize) -> bool {
        let [ymin, ymax, zmin, zmax] = self.layer.yzminmax[i];
        let [oymin, oymax, ozmin, ozmax] = other.layer.yzminmax[j];
        ymin <= oymax && ymax >= oymin && zmin <= ozmax && zmax >= ozmin
    }
}

fn index(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

/// Sweep-and-prune inside one xmin-sorted range.
fn sweep_self(side: Side<'_>, out: &mut AppendWriter<'_, BodyPair>) {
    let layer = side.layer;
    for i in side.range.clone() {
        let xmax = layer.xmax[i];
        for j in i + 1..side.range.end {
            if layer.xmin[j] > xmax {
                break;
            }
            if side.overlaps(i, &side, j) {
                out.write(BodyPair {
                    a: index(i),
                    b: index(j),
                });
            }
        }
    }
}

/// Sweep-and-prune between two xmin-sorted ranges; `flip` swaps the output.
fn sweep_bipartite(left: Side<'_>, right: Side<'_>, flip: bool, out: &mut AppendWriter<'_, BodyPair>) {
    let mut emit = |i: usize, j: usize| {
        let (a, b) = if flip { (j, i) } else { (i, j) };
        out.write(BodyPair {
            a: index(a),
            b: index(b),
        });
    };
    let (mut i, mut j) = (left.range.start, right.range.start);
    while i < left.range.end && j < right.range.end {
        if left.layer.xmin[i] <= right.layer.xmin[j] {
            let xmax = left.layer.xmax[i];
            for k in j..right.range.end {
                if right.layer.xmin[k] > xmax {
                    break;
                }
                if left.overlaps(i, &right, k) {
                    emit(i, k);
                }
            }
            i += 1;
        } else {
            let xmax = right.layer.xmax[j];
            for k in i..left.range.end {
                if left.layer.xmin[k] > xmax {
                    break;
                }
                if right.overlaps(j, &left, k) {
                    emit(k, j);
                }
            }
            j += 1;
        }
    }
}

/// Canonical order: ascending `a`, then ascending `b`.
fn canonicalize(pairs: Vec<BodyPair>) -> Vec<BodyPair> {
    let mut ranks = Vec::new();
    let mut scratch = Vec::new();
    let keys_b: Vec<i32> = pairs.iter().map(|p| unsigned_key(p.b)).collect();
    rank_sort_into(&keys_b, &mut ranks, &mut scratch);
    let by_b: Vec<BodyPair> = ranks.iter().map(|&r| pairs[r as usize]).collect();
    let keys_a: Vec<i32> = by_b.iter().map(|p| unsigned_key(p.a)).collect();
    rank_sort_into(&keys_a, &mut ranks, &mut scratch);
    ranks.iter().map(|&r| by_b[r as usize]).collect()
}

fn run_jobs<E: JobExecutor>(
    executor: &E,
    jobs: usize,
    job: impl Fn(usize, &mut AppendWriter<'_, BodyPair>) + Sync,
) -> Result<Vec<BodyPair>, CollideError> {
    let buffer = ParallelAppendBuffer::new(executor.worker_count());
    let results = executor.map_jobs(jobs, |worker: WorkerIndex, i| {
        let mut writer = buffer.writer(worker)?;
        job(i, &mut writer);
        Ok::<(), CollideError>(())
    });
    results.into_iter().collect::<Result<(), _>>()?;
    Ok(canonicalize(buffer.into_vec()))
}

/// Every pair of bodies in `layer` whose bounds overlap, in `(a, b)` order.
///
/// # Errors
/// Only if the executor hands out a worker index it did not advertise.
#[instrument(skip_all, fields(bodies = layer.len()))]
pub fn find_pairs<E: JobExecutor>(layer: &CollisionLayer, executor: &E) -> Result<Vec<BodyPair>, CollideError> {
    let cells = layer.settings.cell_count() as usize;
    let pairs = run_jobs(executor, cells + 1, |job, out| {
        if job == cells {
            sweep_self(Side::bucket(layer, cells), out);
            return;
        }
        sweep_self(Side::bucket(layer, job), out);
        sweep_bipartite(Side::bucket(layer, job), Side::bucket(layer, cells), false, out);
    })?;
    debug!(pairs = pairs.len(), "self pairs found");
    Ok(pairs)
}

/// Every pair `(a in first, b in second)` whose bounds overlap.
///
/// # Errors
/// [`CollideError::InvalidSettings`] when the layers use different grids.
#[instrument(skip_all, fields(first = first.len(), second = second.len()))]
pub fn find_pairs_between<E: JobExecutor>(
    first: &CollisionLayer,
    second: &CollisionLayer,
    executor: &E,
) -> Result<Vec<BodyPair>, CollideError> {
    if first.settings != second.settings {
        return Err(CollideError::InvalidSettings(
            "pair search between layers requires identical grid settings",
        ));
    }
    let cells = first.settings.cell_count() as usize;
    let pairs = run_jobs(executor, cells + 1, |job, out| {
        if job == cells {
            sweep_bipartite(Side::bucket(first, cells), Side::bucket(second, cells), false, out);
            return;
        }
        sweep_bipartite(Side::bucket(first, job), Side::bucket(second, job), false, out);
        sweep_bipartite(Side::bucket(first, job), Side::bucket(second, cells), false, out);
        sweep_bipartite(Side::bucket(second, job), Side::bucket(first, cells), true, out);
    })?;
    debug!(pairs = pairs.len(), "pairs between layers found");
    Ok(pairs)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::exec::SerialExecutor;
    use crate::layer::{ColliderBody, CollisionLayerSettings, EntityId};
    use warp_geom::shapes::BoxCollider;
    use warp_geom::{TransformQvvs, Vec3};

    fn cube(x: f32, y: f32, half: f32) -> ColliderBody {
        ColliderBody::new(
            BoxCollider::new(Vec3::ZERO, Vec3::splat(half)),
            TransformQvvs::from_position(Vec3::new(x, y, 3.0)),
            EntityId(0),
        )
    }

    fn brute_force(layer: &CollisionLayer) -> Vec<BodyPair> {
        let mut out = Vec::new();
        let nan = layer.settings().nan_bucket() as usize;
        let excluded = layer.bucket_ranges()[nan].indices();
        for i in 0..layer.len() {
            for j in i + 1..layer.len() {
                if excluded.contains(&i) || excluded.contains(&j) {
                    continue;
                }
                let (a, b) = (layer.get_aabb(i).expect("a"), layer.get_aabb(j).expect("b"));
                if a.overlaps(&b) {
                    out.push(BodyPair { a: index(i), b: index(j) });
                }
            }
        }
        out
    }

    #[test]
    fn self_pairs_match_brute_force() {
        let bodies: Vec<ColliderBody> = (0..40)
            .map(|i| {
                let f = i as f32;
                cube((f * 7.3) % 30.0 - 15.0, (f * 3.1) % 10.0, 1.0 + (f % 3.0))
            })
            .collect();
        let layer = CollisionLayer::build(bodies, CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("build");
        let pairs = find_pairs(&layer, &SerialExecutor).expect("pairs");
        assert_eq!(pairs, brute_force(&layer));
    }

    #[test]
    fn pairs_between_require_matching_grids() {
        let a = CollisionLayer::build(vec![cube(0.0, 0.0, 1.0)], CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("a");
        let other = CollisionLayerSettings {
            world_subdivisions_per_axis: [4, 4, 4],
            ..CollisionLayerSettings::default()
        };
        let b = CollisionLayer::build(vec![cube(0.0, 0.0, 1.0)], other, 2, &SerialExecutor).expect("b");
        assert!(matches!(
            find_pairs_between(&a, &b, &SerialExecutor),
            Err(CollideError::InvalidSettings(_))
        ));
    }

    #[test]
    fn pairs_between_cover_cells_and_cross() {
        let first = CollisionLayer::build(
            vec![cube(5.0, 5.0, 1.0), cube(0.0, 0.0, 1.0), cube(-5.0, 5.0, 1.0)],
            CollisionLayerSettings::default(),
            1,
            &SerialExecutor,
        )
        .expect("first");
        let second = CollisionLayer::build(
            vec![cube(6.0, 5.0, 1.0), cube(-5.5, 5.0, 1.0), cube(100.0, 100.0, 1.0)],
            CollisionLayerSettings::default(),
            2,
            &SerialExecutor,
        )
        .expect("second");
        let pairs = find_pairs_between(&first, &second, &SerialExecutor).expect("pairs");
        let named: Vec<(u32, u32)> = pairs
            .iter()
            .map(|p| (first.source_indices()[p.a as usize], second.source_indices()[p.b as usize]))
            .collect();
        let mut named_sorted = named.clone();
        named_sorted.sort_unstable();
        assert_eq!(named_sorted, vec![(0, 0), (2, 1)]);
        assert!(pairs.windows(2).all(|w| w[0] <= w[1]));
    }
}
