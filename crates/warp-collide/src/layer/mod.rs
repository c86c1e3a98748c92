// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bucketed spatial index over collider bounds.
//!
//! A [`CollisionLayer`] is built once per snapshot and is immutable
//! afterwards. Bodies are stored bucket-major; inside each bucket they are
//! ordered by ascending `xmin` and covered by an implicit interval tree over
//! x. The y and z extents live in a packed side array so overlap tests touch
//! one cache line per body.
//!
//! Bucket layout for a grid of `n` cells:
//!
//! | bucket      | contents                                       |
//! |-------------|------------------------------------------------|
//! | `0..n`      | bodies whose bounds fit inside one grid cell   |
//! | `n`         | cross bucket: everything spanning cells        |
//! | `n + 1`     | NaN bucket: never visited by queries or pairs  |

mod build;
mod pairs;
mod settings;
mod world;

use std::num::NonZeroU32;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use warp_geom::broad::interval_tree::{IntervalNode, IntervalTree, Overlaps};
use warp_geom::{Aabb, Collider, TransformQvvs};

pub use pairs::{find_pairs, find_pairs_between, BodyPair};
pub use settings::{CollisionLayerSettings, MAX_GRID_CELLS};
pub use world::{ArchetypeMask, CollisionWorld, FindWorldOverlaps, WorldBody};

/// Opaque host identifier carried through the index untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u64);

/// A collider placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderBody {
    /// Shape in its own unscaled space.
    pub collider: Collider,
    /// World placement including scale and stretch.
    pub transform: TransformQvvs,
    /// Host identifier.
    pub entity: EntityId,
}

impl ColliderBody {
    /// Body from its parts.
    pub fn new(collider: impl Into<Collider>, transform: TransformQvvs, entity: EntityId) -> Self {
        Self {
            collider: collider.into(),
            transform,
            entity,
        }
    }

    /// World bounds.
    pub fn aabb(&self) -> Aabb {
        self.collider.aabb(&self.transform)
    }
}

/// A body tagged with its caller position, for gathered builds.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedBody {
    /// Position of this body in the caller's logical input order.
    pub source_index: u32,
    /// The body itself.
    pub body: ColliderBody,
}

/// Contiguous slice of the body arrays owned by one bucket.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct BucketRange {
    /// First body index.
    pub start: u32,
    /// Body count.
    pub count: u32,
}

impl BucketRange {
    /// Body indices covered by this bucket.
    pub fn indices(&self) -> Range<usize> {
        let start = self.start as usize;
        start..start + self.count as usize
    }
}

/// Immutable spatial index over one snapshot of bodies.
#[derive(Debug, Clone)]
pub struct CollisionLayer {
    settings: CollisionLayerSettings,
    world_index: NonZeroU32,
    bucket_ranges: Vec<BucketRange>,
    xmin: Vec<f32>,
    xmax: Vec<f32>,
    yzminmax: Vec<[f32; 4]>,
    interval_nodes: Vec<IntervalNode>,
    source_indices: Vec<u32>,
    bodies: Vec<ColliderBody>,
}

impl CollisionLayer {
    /// Grid settings the layer was built with.
    pub fn settings(&self) -> &CollisionLayerSettings {
        &self.settings
    }

    /// Non-zero tag distinguishing coexisting layers.
    pub fn world_index(&self) -> u32 {
        self.world_index.get()
    }

    /// Number of bodies, NaN-bounded ones included.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// `true` for an index over an empty snapshot.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in index order.
    pub fn bodies(&self) -> &[ColliderBody] {
        &self.bodies
    }

    /// `source_indices()[i]` is the caller position of body `i`.
    pub fn source_indices(&self) -> &[u32] {
        &self.source_indices
    }

    /// Per-bucket `(start, count)`; see the module docs for the layout.
    pub fn bucket_ranges(&self) -> &[BucketRange] {
        &self.bucket_ranges
    }

    /// Per-body minimum x.
    pub fn xmin(&self) -> &[f32] {
        &self.xmin
    }

    /// Per-body maximum x.
    pub fn xmax(&self) -> &[f32] {
        &self.xmax
    }

    /// Per-body `(ymin, ymax, zmin, zmax)`.
    pub fn yzminmax(&self) -> &[[f32; 4]] {
        &self.yzminmax
    }

    /// Interval tree nodes, aligned with the body arrays bucket by bucket.
    pub fn interval_nodes(&self) -> &[IntervalNode] {
        &self.interval_nodes
    }

    /// World bounds of body `index`.
    pub fn get_aabb(&self, index: usize) -> Option<Aabb> {
        let xmin = *self.xmin.get(index)?;
        let xmax = self.xmax[index];
        let [ymin, ymax, zmin, zmax] = self.yzminmax[index];
        Some(Aabb::new(
            warp_geom::Vec3::new(xmin, ymin, zmin),
            warp_geom::Vec3::new(xmax, ymax, zmax),
        ))
    }

    /// Interval tree of `bucket`.
    pub fn bucket_tree(&self, bucket: usize) -> IntervalTree<'_> {
        let nodes = self
            .bucket_ranges
            .get(bucket)
            .map_or(&[][..], |r| &self.interval_nodes[r.indices()]);
        IntervalTree::new(nodes)
    }

    /// Bodies whose bounds overlap `aabb` (inclusive), lazily.
    ///
    /// Visits the grid cells touched by `aabb`, then the cross bucket. Each
    /// index is yielded once. Pruning is by bounds only.
    pub fn find_overlaps(&self, aabb: &Aabb) -> FindOverlaps<'_> {
        FindOverlaps {
            layer: self,
            query: *aabb,
            buckets: BucketWalk::new(&self.settings, aabb),
            current: None,
        }
    }

    /// `true` when the bounds of body `index` overlap `aabb` on y and z.
    #[inline]
    pub(crate) fn overlaps_yz(&self, index: usize, aabb: &Aabb) -> bool {
        let [ymin, ymax, zmin, zmax] = self.yzminmax[index];
        let (lo, hi) = (aabb.min(), aabb.max());
        ymin <= hi.y() && ymax >= lo.y() && zmin <= hi.z() && zmax >= lo.z()
    }

    /// BLAKE3 digest over every array that defines the index structure.
    ///
    /// Equal digests mean bit-identical buckets, ranges, bounds, source
    /// indices and trees. Bodies themselves are covered through their
    /// source indices and bounds.
    pub fn structure_digest(&self) -> [u8; 32] {
        let mut h = blake3::Hasher::new();
        h.update(b"warp-collide:layer:v1");
        let (wmin, wmax) = (self.settings.world_aabb.min(), self.settings.world_aabb.max());
        for v in wmin.to_array().into_iter().chain(wmax.to_array()) {
            h.update(&v.to_bits().to_le_bytes());
        }
        for s in self.settings.world_subdivisions_per_axis {
            h.update(&s.to_le_bytes());
        }
        h.update(&self.world_index.get().to_le_bytes());
        h.update(&(self.bodies.len() as u64).to_le_bytes());
        for r in &self.bucket_ranges {
            h.update(&r.start.to_le_bytes());
            h.update(&r.count.to_le_bytes());
        }
        for (i, &src) in self.source_indices.iter().enumerate() {
            h.update(&src.to_le_bytes());
            h.update(&self.xmin[i].to_bits().to_le_bytes());
            h.update(&self.xmax[i].to_bits().to_le_bytes());
            for v in self.yzminmax[i] {
                h.update(&v.to_bits().to_le_bytes());
            }
        }
        for n in &self.interval_nodes {
            h.update(&n.min.to_bits().to_le_bytes());
            h.update(&n.max.to_bits().to_le_bytes());
            h.update(&n.subtree_max.to_bits().to_le_bytes());
            h.update(&n.index.to_le_bytes());
        }
        h.finalize().into()
    }

    /// Releases every array. Dropping the layer does the same.
    pub fn dispose(self) {}
}

/// Buckets a query must visit: touched cells in x-major order, then cross.
#[derive(Debug, Clone)]
pub(crate) struct BucketWalk {
    lo: [u32; 3],
    hi: [u32; 3],
    next_cell: Option<[u32; 3]>,
    dims: [u32; 3],
    cross: Option<u32>,
}

impl BucketWalk {
    pub(crate) fn new(settings: &CollisionLayerSettings, aabb: &Aabb) -> Self {
        if aabb.has_nan() {
            return Self {
                lo: [0; 3],
                hi: [0; 3],
                next_cell: None,
                dims: settings.world_subdivisions_per_axis,
                cross: None,
            };
        }
        let lo = settings.cell_coords(&aabb.min());
        let hi = settings.cell_coords(&aabb.max());
        Self {
            lo,
            hi,
            next_cell: Some(lo),
            dims: settings.world_subdivisions_per_axis,
            cross: Some(settings.cross_bucket()),
        }
    }
}

impl Iterator for BucketWalk {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if let Some(cell) = self.next_cell {
            let mut following = cell;
            self.next_cell = 'advance: {
                for axis in (0..3).rev() {
                    if following[axis] < self.hi[axis] {
                        following[axis] += 1;
                        break 'advance Some(following);
                    }
                    following[axis] = self.lo[axis];
                }
                None
            };
            let [_, ny, nz] = self.dims;
            return Some(cell[0] * ny * nz + cell[1] * nz + cell[2]);
        }
        self.cross.take()
    }
}

/// Iterator returned by [`CollisionLayer::find_overlaps`].
#[derive(Debug, Clone)]
pub struct FindOverlaps<'a> {
    layer: &'a CollisionLayer,
    query: Aabb,
    buckets: BucketWalk,
    current: Option<(usize, Overlaps<'a>)>,
}

impl Iterator for FindOverlaps<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some((start, overlaps)) = &mut self.current {
                for local in overlaps.by_ref() {
                    let index = *start + local as usize;
                    if self.layer.overlaps_yz(index, &self.query) {
                        return Some(index);
                    }
                }
                self.current = None;
            }
            let bucket = self.buckets.next()? as usize;
            let range = self.layer.bucket_ranges[bucket];
            if range.count == 0 {
                continue;
            }
            let tree = self.layer.bucket_tree(bucket);
            self.current = Some((
                range.start as usize,
                tree.overlaps(self.query.min().x(), self.query.max().x()),
            ));
        }
    }
}
