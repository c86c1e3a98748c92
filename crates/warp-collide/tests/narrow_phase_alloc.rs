// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, unsafe_code, clippy::expect_used)]
//! Narrow-phase queries on primitives never touch the heap.
//!
//! Kept to a single test so no other test allocates while counting.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use warp_collide::distance_between;
use warp_geom::shapes::{ConvexBlob, ConvexCollider};
use warp_geom::{Collider, Quat, TransformQvvs, Vec3};

struct CountingAlloc;

static COUNTING: AtomicBool = AtomicBool::new(false);
static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

// SAFETY: forwards every call to the system allocator unchanged.
unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if COUNTING.load(Ordering::Relaxed) {
            ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

#[test]
fn penetrating_hulls_resolve_without_allocating() {
    let hull: Collider = ConvexCollider::new(Arc::new(ConvexBlob::cuboid(Vec3::new(1.0, 0.75, 1.25)))).into();
    let a = TransformQvvs::new(
        Vec3::ZERO,
        Quat::from_axis_angle(Vec3::new(1.0, 2.0, 0.5), 0.6),
        1.0,
        Vec3::ONE,
    );
    let b = TransformQvvs::new(
        Vec3::new(0.8, 0.3, -0.2),
        Quat::from_axis_angle(Vec3::new(-0.3, 1.0, 1.0), 1.1),
        1.0,
        Vec3::ONE,
    );

    COUNTING.store(true, Ordering::SeqCst);
    let overlapping = distance_between(&hull, &a, &hull, &b, 0.0);
    let apart = distance_between(&hull, &a, &hull, &b.with_position(Vec3::new(6.0, 0.0, 0.0)), 10.0);
    COUNTING.store(false, Ordering::SeqCst);

    assert_eq!(ALLOCATIONS.load(Ordering::SeqCst), 0);
    let overlapping = overlapping.expect("overlap");
    assert!(overlapping.distance < 0.0);
    assert!(apart.expect("apart").distance > 0.0);
}
