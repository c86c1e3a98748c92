// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Archetype-segmented collision index.
//!
//! A [`CollisionWorld`] is a [`CollisionLayer`] plus a second index that
//! splits every bucket by archetype. Archetype keys are opaque `u32`s from
//! the host; they are mapped to dense ids in ascending key order. Inside each
//! `(bucket, archetype)` range bodies stay in `xmin` order and get their own
//! interval tree, so filtered queries skip foreign archetypes wholesale.

use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use warp_geom::broad::interval_tree::{build_nodes, IntervalNode, IntervalTree, Overlaps};
use warp_geom::Aabb;

use super::{BucketRange, BucketWalk, CollisionLayer, CollisionLayerSettings, ColliderBody};
use crate::error::CollideError;
use crate::exec::JobExecutor;

/// A body tagged with its host archetype key.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBody {
    /// The body.
    pub body: ColliderBody,
    /// Host archetype key.
    pub archetype: u32,
}

/// Set of dense archetype ids accepted by a filtered query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchetypeMask {
    words: Vec<u64>,
}

impl ArchetypeMask {
    /// Mask accepting nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds dense id `archetype`.
    pub fn insert(&mut self, archetype: u32) {
        let word = (archetype / 64) as usize;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (archetype % 64);
    }

    /// `true` when dense id `archetype` is accepted.
    pub fn contains(&self, archetype: u32) -> bool {
        self.words
            .get((archetype / 64) as usize)
            .is_some_and(|w| w & (1 << (archetype % 64)) != 0)
    }

    /// Accepted ids, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros();
                bits &= bits - 1;
                #[allow(clippy::cast_possible_truncation)]
                Some(i as u32 * 64 + bit)
            })
        })
    }
}

/// Collision layer with a per-archetype index for type-filtered queries.
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    layer: CollisionLayer,
    archetype_keys: Vec<u32>,
    dense_ids: FxHashMap<u32, u32>,
    body_archetypes: Vec<u32>,
    /// `bucket * archetype_count + archetype` ranges into `archetype_bodies`.
    archetype_ranges: Vec<BucketRange>,
    archetype_bodies: Vec<u32>,
    archetype_nodes: Vec<IntervalNode>,
}

impl CollisionWorld {
    /// Builds the layer and its archetype index.
    ///
    /// # Errors
    /// As [`CollisionLayer::build`].
    #[instrument(skip_all, fields(bodies = bodies.len(), world_index = world_index))]
    pub fn build<E: JobExecutor>(
        bodies: Vec<WorldBody>,
        settings: CollisionLayerSettings,
        world_index: u32,
        executor: &E,
    ) -> Result<Self, CollideError> {
        let (bodies, keys): (Vec<ColliderBody>, Vec<u32>) =
            bodies.into_iter().map(|b| (b.body, b.archetype)).unzip();

        let mut archetype_keys = keys.clone();
        archetype_keys.sort_unstable();
        archetype_keys.dedup();
        let dense_ids: FxHashMap<u32, u32> = archetype_keys
            .iter()
            .enumerate()
            .map(|(i, &k)| (k, u32::try_from(i).unwrap_or(u32::MAX)))
            .collect();

        let layer = CollisionLayer::build(bodies, settings, world_index, executor)?;
        let body_archetypes: Vec<u32> = layer
            .source_indices()
            .iter()
            .map(|&src| dense_ids.get(&keys[src as usize]).copied().unwrap_or(0))
            .collect();

        let archetype_count = archetype_keys.len();
        let per_bucket = executor.map_jobs(layer.bucket_ranges().len(), |_, bucket| {
            split_bucket(
                layer.bucket_ranges()[bucket],
                archetype_count,
                &body_archetypes,
                &layer,
            )
        });

        let mut archetype_ranges = Vec::with_capacity(per_bucket.len() * archetype_count);
        let mut archetype_bodies = Vec::with_capacity(layer.len());
        let mut archetype_nodes = Vec::with_capacity(layer.len());
        for (counts, bodies, nodes) in per_bucket {
            let base = u32::try_from(archetype_bodies.len()).unwrap_or(u32::MAX);
            let mut start = base;
            for count in counts {
                archetype_ranges.push(BucketRange { start, count });
                start += count;
            }
            archetype_bodies.extend(bodies);
            archetype_nodes.extend(nodes);
        }
        debug!(archetypes = archetype_count, "archetype index built");

        Ok(Self {
            layer,
            archetype_keys,
            dense_ids,
            body_archetypes,
            archetype_ranges,
            archetype_bodies,
            archetype_nodes,
        })
    }

    /// The underlying layer; unfiltered queries run against it.
    pub fn layer(&self) -> &CollisionLayer {
        &self.layer
    }

    /// Distinct archetype keys, ascending; position is the dense id.
    pub fn archetype_keys(&self) -> &[u32] {
        &self.archetype_keys
    }

    /// Dense id for a host key.
    pub fn archetype_id(&self, key: u32) -> Option<u32> {
        self.dense_ids.get(&key).copied()
    }

    /// Dense archetype id of body `index`.
    pub fn body_archetype(&self, index: usize) -> Option<u32> {
        self.body_archetypes.get(index).copied()
    }

    /// Mask accepting the given host keys; unknown keys are ignored.
    pub fn mask_for_keys(&self, keys: &[u32]) -> ArchetypeMask {
        let mut mask = ArchetypeMask::empty();
        for id in keys.iter().filter_map(|&k| self.archetype_id(k)) {
            mask.insert(id);
        }
        mask
    }

    /// Mask accepting every archetype in this world.
    pub fn mask_all(&self) -> ArchetypeMask {
        let mut mask = ArchetypeMask::empty();
        for id in 0..self.archetype_keys.len() {
            mask.insert(u32::try_from(id).unwrap_or(u32::MAX));
        }
        mask
    }

    /// Bodies of an accepted archetype whose bounds overlap `aabb`, lazily.
    ///
    /// Order is bucket, then dense archetype id, then `xmin`.
    pub fn find_overlaps_filtered(&self, aabb: &Aabb, mask: &ArchetypeMask) -> FindWorldOverlaps<'_> {
        let count = self.archetype_keys.len();
        FindWorldOverlaps {
            world: self,
            query: *aabb,
            buckets: BucketWalk::new(self.layer.settings(), aabb),
            bucket: None,
            archetypes: mask.iter().take_while(|&a| (a as usize) < count).collect(),
            next_archetype: 0,
            current: None,
        }
    }

    fn range(&self, bucket: usize, archetype: u32) -> BucketRange {
        self.archetype_ranges[bucket * self.archetype_keys.len() + archetype as usize]
    }

    /// Releases every array.
    pub fn dispose(self) {}
}

type BucketSplit = (Vec<u32>, Vec<u32>, Vec<IntervalNode>);

/// Stable split of one bucket by archetype, with a tree per archetype.
fn split_bucket(
    range: BucketRange,
    archetype_count: usize,
    body_archetypes: &[u32],
    layer: &CollisionLayer,
) -> BucketSplit {
    let mut counts = vec![0u32; archetype_count];
    for i in range.indices() {
        counts[body_archetypes[i] as usize] += 1;
    }
    let mut cursor = Vec::with_capacity(archetype_count);
    let mut start = 0u32;
    for &c in &counts {
        cursor.push(start);
        start += c;
    }
    let mut bodies = vec![0u32; range.count as usize];
    for i in range.indices() {
        let slot = &mut cursor[body_archetypes[i] as usize];
        bodies[*slot as usize] = u32::try_from(i).unwrap_or(u32::MAX);
        *slot += 1;
    }

    let mut nodes = vec![IntervalNode::default(); bodies.len()];
    let mut offset = 0usize;
    for &c in &counts {
        let span = offset..offset + c as usize;
        let intervals: Vec<(f32, f32)> = bodies[span.clone()]
            .iter()
            .map(|&b| (layer.xmin()[b as usize], layer.xmax()[b as usize]))
            .collect();
        let is_nan = intervals.iter().any(|(lo, hi)| lo.is_nan() || hi.is_nan());
        if !is_nan {
            build_nodes(&intervals, &mut nodes[span]);
        }
        offset += c as usize;
    }
    (counts, bodies, nodes)
}

/// Iterator returned by [`CollisionWorld::find_overlaps_filtered`].
#[derive(Debug, Clone)]
pub struct FindWorldOverlaps<'a> {
    world: &'a CollisionWorld,
    query: Aabb,
    buckets: BucketWalk,
    bucket: Option<usize>,
    archetypes: Vec<u32>,
    next_archetype: usize,
    current: Option<(usize, Overlaps<'a>)>,
}

impl Iterator for FindWorldOverlaps<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some((start, overlaps)) = &mut self.current {
                for local in overlaps.by_ref() {
                    let body = self.world.archetype_bodies[*start + local as usize] as usize;
                    if self.world.layer.overlaps_yz(body, &self.query) {
                        return Some(body);
                    }
                }
                self.current = None;
            }
            if let Some(bucket) = self.bucket {
                if let Some(&archetype) = self.archetypes.get(self.next_archetype) {
                    self.next_archetype += 1;
                    let range = self.world.range(bucket, archetype);
                    if range.count > 0 {
                        let tree = IntervalTree::new(&self.world.archetype_nodes[range.indices()]);
                        self.current = Some((
                            range.start as usize,
                            tree.overlaps(self.query.min().x(), self.query.max().x()),
                        ));
                    }
                    continue;
                }
                self.bucket = None;
            }
            let bucket = self.buckets.next()? as usize;
            self.bucket = Some(bucket);
            self.next_archetype = 0;
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::exec::SerialExecutor;
    use crate::layer::EntityId;
    use warp_geom::shapes::SphereCollider;
    use warp_geom::{TransformQvvs, Vec3};

    fn body(x: f32, archetype: u32, id: u64) -> WorldBody {
        WorldBody {
            body: ColliderBody::new(
                SphereCollider::new(Vec3::ZERO, 1.0),
                TransformQvvs::from_position(Vec3::new(x, 5.0, 5.0)),
                EntityId(id),
            ),
            archetype,
        }
    }

    #[test]
    fn mask_bits_round_trip() {
        let mut mask = ArchetypeMask::empty();
        mask.insert(3);
        mask.insert(70);
        assert!(mask.contains(3) && mask.contains(70) && !mask.contains(4));
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![3, 70]);
    }

    #[test]
    fn filtered_query_returns_only_masked_archetypes() {
        let bodies = vec![body(5.0, 900, 0), body(6.0, 17, 1), body(7.0, 900, 2), body(40.0, 17, 3)];
        let world = CollisionWorld::build(bodies, CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("build");
        assert_eq!(world.archetype_keys(), &[17, 900]);
        let q = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));

        let only_900 = world.mask_for_keys(&[900]);
        let mut ids: Vec<u64> = world
            .find_overlaps_filtered(&q, &only_900)
            .map(|i| world.layer().bodies()[i].entity.0)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 2]);

        let all = world.mask_all();
        assert_eq!(world.find_overlaps_filtered(&q, &all).count(), 3);
        assert_eq!(world.find_overlaps_filtered(&q, &ArchetypeMask::empty()).count(), 0);
    }
}
