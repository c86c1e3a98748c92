// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Collision layer build throughput.
//!
//! # Running
//!
//! ```sh
//! cargo bench --package warp-benches --bench layer_build
//! ```
//!
//! # What This Measures
//!
//! - `layer_build/serial/N`: single-threaded build of N scattered bodies
//! - `layer_build/scoped_Ww/N`: scoped-thread executor with W workers
//! - `layer_build/rayon_Ww/N`: rayon pool with W workers
//! - `find_pairs/N`: self pair search on a built layer
mod common;

use std::num::NonZeroUsize;
use std::time::Duration;

use common::{scatter_bodies, RayonExecutor};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use warp_collide::{find_pairs, CollisionLayer, CollisionLayerSettings, ScopedThreadExecutor, SerialExecutor};

fn settings() -> CollisionLayerSettings {
    CollisionLayerSettings {
        world_subdivisions_per_axis: [4, 2, 4],
        ..CollisionLayerSettings::default()
    }
}

fn bench_layer_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("layer_build");
    group
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(5))
        .sample_size(30);

    for &n in &[1_000usize, 10_000, 100_000] {
        group.throughput(Throughput::Elements(n as u64));
        let bodies = scatter_bodies(n, 900.0, 0x5eed);

        group.bench_with_input(BenchmarkId::new("serial", n), &n, |b, _| {
            b.iter_batched(
                || bodies.clone(),
                |bodies| CollisionLayer::build(bodies, settings(), 1, &SerialExecutor),
                BatchSize::LargeInput,
            );
        });

        for workers in [2usize, 4, 8] {
            let scoped = ScopedThreadExecutor::new(NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN));
            group.bench_with_input(BenchmarkId::new(format!("scoped_{workers}w"), n), &n, |b, _| {
                b.iter_batched(
                    || bodies.clone(),
                    |bodies| CollisionLayer::build(bodies, settings(), 1, &scoped),
                    BatchSize::LargeInput,
                );
            });

            let rayon = RayonExecutor::new(workers);
            group.bench_with_input(BenchmarkId::new(format!("rayon_{workers}w"), n), &n, |b, _| {
                b.iter_batched(
                    || bodies.clone(),
                    |bodies| CollisionLayer::build(bodies, settings(), 1, &rayon),
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_find_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_pairs");
    group.sample_size(20);
    let executor = RayonExecutor::new(4);
    for &n in &[1_000usize, 10_000] {
        let Ok(layer) = CollisionLayer::build(scatter_bodies(n, 200.0, 0xfeed), settings(), 1, &executor) else {
            continue;
        };
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &layer, |b, layer| {
            b.iter(|| find_pairs(criterion::black_box(layer), &executor));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layer_build, bench_find_pairs);
criterion_main!(benches);
