// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Deterministic spatial index and narrow-phase queries for Echo.

This crate provides:
- A [`JobExecutor`] seam so hosts run batch jobs on their own thread pool.
- [`ParallelAppendBuffer`], per-worker append chains merged in a fixed order.
- [`rank_sort`], a stable LSD radix sort that returns ranks.
- [`CollisionLayer`], a bucket grid of xmin-sorted bodies with one interval
  tree per bucket, plus [`CollisionWorld`] which splits buckets by archetype.
- Narrow-phase [`raycast`], [`point_distance`], [`distance_between`] and
  [`collider_cast`] for every collider kind, and the same queries against a
  whole layer.
- Bounds-overlap pair search within a layer and between two layers.
- Hex debug dumps of single queries that replay exactly.

Design notes:
- Built layers are bit-identical for any worker count.
- A built layer is immutable and `Sync`; queries never allocate per primitive.
- Misses are `None`; errors are reserved for invalid input.
"]
#![forbid(unsafe_code)]

pub mod append;
pub mod dump;
mod error;
pub mod exec;
pub mod layer;
pub mod query;
pub mod sort;

pub use append::{AppendWriter, ParallelAppendBuffer};
pub use dump::{QueryDump, QueryOutcome};
pub use error::{CollideError, DumpError};
pub use exec::{JobExecutor, ScopedThreadExecutor, SerialExecutor, WorkerIndex};
pub use layer::{
    find_pairs, find_pairs_between, ArchetypeMask, BodyPair, BucketRange, ColliderBody, CollisionLayer,
    CollisionLayerSettings, CollisionWorld, EntityId, SourcedBody, WorldBody,
};
pub use query::{
    collider_cast, distance_between, point_distance, raycast, ColliderCastResult, DistanceResult, LayerBodyInfo,
    PointDistanceResult, RaycastResult,
};
pub use sort::rank_sort;
