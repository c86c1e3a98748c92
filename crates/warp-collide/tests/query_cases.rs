// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::expect_used, clippy::float_cmp)]
//! Literal query cases and cross-checks between the narrow-phase queries.

mod common;

use common::{compound_collider, hull_collider, XorShift64};
use std::sync::Arc;
use warp_collide::{
    collider_cast, distance_between, point_distance, raycast, ColliderBody, CollisionLayer, CollisionLayerSettings,
    EntityId, SerialExecutor,
};
use warp_geom::shapes::{BoxCollider, CapsuleCollider, SphereCollider, TerrainBlob, TerrainCollider};
use warp_geom::{Collider, Quat, Ray, TransformQvvs, Vec3};

fn close(a: Vec3, b: Vec3, tol: f32) -> bool {
    a.distance(&b) < tol
}

fn unit_sphere() -> Collider {
    SphereCollider::new(Vec3::ZERO, 1.0).into()
}

#[test]
fn ray_along_z_hits_unit_sphere() {
    let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);
    let hit = raycast(&ray, &unit_sphere(), &TransformQvvs::identity()).expect("hit");
    assert!((hit.fraction - 0.9).abs() < 1e-5);
    assert!((hit.distance - 9.0).abs() < 1e-4);
    assert!(close(hit.position, Vec3::new(0.0, 0.0, -1.0), 1e-4));
    assert!(close(hit.normal, Vec3::new(0.0, 0.0, -1.0), 1e-5));
    assert_eq!(hit.subcollider_index, 0);
}

#[test]
fn ray_starting_inside_misses() {
    let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
    assert!(raycast(&ray, &unit_sphere(), &TransformQvvs::identity()).is_none());
    let b: Collider = BoxCollider::new(Vec3::ZERO, Vec3::ONE).into();
    assert!(raycast(&ray, &b, &TransformQvvs::identity()).is_none());
}

#[test]
fn ray_hits_rotated_box_face() {
    let b: Collider = BoxCollider::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)).into();
    let placed = TransformQvvs::new(
        Vec3::new(10.0, 0.0, 0.0),
        Quat::from_axis_angle(Vec3::UNIT_Y, std::f32::consts::FRAC_PI_2),
        1.0,
        Vec3::ONE,
    );
    // Local +Z face (half 3) now faces +X.
    let ray = Ray::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0));
    let hit = raycast(&ray, &b, &placed).expect("hit");
    assert!(close(hit.position, Vec3::new(13.0, 0.0, 0.0), 1e-4));
    assert!(close(hit.normal, Vec3::UNIT_X, 1e-4));
}

#[test]
fn ray_hits_scaled_terrain() {
    let blob = TerrainBlob::new(2, 2, vec![0; 9]).expect("terrain");
    let terrain: Collider = TerrainCollider::new(Arc::new(blob)).into();
    let placed = TransformQvvs::new(Vec3::ZERO, Quat::identity(), 4.0, Vec3::ONE);
    let ray = Ray::new(Vec3::new(5.0, 3.0, 5.0), Vec3::new(5.0, -3.0, 5.0));
    let hit = raycast(&ray, &terrain, &placed).expect("hit");
    assert!((hit.fraction - 0.5).abs() < 1e-5);
    assert!(close(hit.normal, Vec3::UNIT_Y, 1e-5));
    let outside = Ray::new(Vec3::new(9.0, 3.0, 5.0), Vec3::new(9.0, -3.0, 5.0));
    assert!(raycast(&outside, &terrain, &placed).is_none());
}

#[test]
fn point_distance_agrees_with_sphere_distance() {
    let mut rng = XorShift64::new(7);
    let colliders: Vec<Collider> = vec![
        unit_sphere(),
        CapsuleCollider::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0), 0.5).into(),
        BoxCollider::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 2.0)).into(),
        hull_collider(Vec3::new(0.5, 1.0, 0.75)),
        compound_collider(),
    ];
    let tiny: Collider = SphereCollider::new(Vec3::ZERO, 0.0).into();
    for collider in &colliders {
        let transform = TransformQvvs::new(
            rng.vec3(2.0),
            Quat::from_axis_angle(rng.vec3(1.0), rng.range(0.0, 3.0)),
            1.0,
            Vec3::ONE,
        );
        for _ in 0..16 {
            let point = rng.vec3(6.0) + Vec3::new(12.0, 0.0, 0.0);
            let by_point = point_distance(&point, collider, &transform, f32::INFINITY).expect("point");
            let by_shape = distance_between(
                collider,
                &transform,
                &tiny,
                &TransformQvvs::from_position(point),
                f32::INFINITY,
            )
            .expect("shape");
            assert!((by_point.distance - by_shape.distance).abs() < 1e-3, "{collider:?}");
            assert!(close(by_point.hitpoint, by_shape.hitpoint_a, 1e-2));
            assert!(by_point.distance > 0.0);
        }
    }
}

#[test]
fn cast_distance_matches_gap_closure() {
    let pairs: Vec<(Collider, Collider)> = vec![
        (unit_sphere(), BoxCollider::new(Vec3::ZERO, Vec3::splat(0.5)).into()),
        (hull_collider(Vec3::splat(0.5)), unit_sphere()),
        (
            BoxCollider::new(Vec3::ZERO, Vec3::splat(0.5)).into(),
            CapsuleCollider::new(Vec3::new(0.0, -2.0, 0.0), Vec3::new(0.0, 2.0, 0.0), 0.5).into(),
        ),
    ];
    let start = TransformQvvs::from_position(Vec3::new(-10.0, 0.0, 0.0));
    let end = Vec3::new(10.0, 0.0, 0.0);
    for (caster, target) in &pairs {
        let hit = collider_cast(caster, &start, &end, target, &TransformQvvs::identity())
            .expect("cast")
            .expect("hit");
        let at = start.with_position(start.position() + Vec3::UNIT_X * hit.distance);
        let gap = distance_between(caster, &at, target, &TransformQvvs::identity(), 1.0).expect("gap");
        assert!(gap.distance.abs() < 2e-3, "gap {} for {caster:?}", gap.distance);
        assert!(close(hit.hitpoint_on_caster, hit.hitpoint_on_target, 1e-2));
        assert!(hit.normal_on_target.x() < 0.0);
    }
}

#[test]
fn cast_that_stops_short_misses() {
    let start = TransformQvvs::from_position(Vec3::new(-10.0, 0.0, 0.0));
    let end = Vec3::new(-5.0, 0.0, 0.0);
    let hit = collider_cast(&unit_sphere(), &start, &end, &unit_sphere(), &TransformQvvs::identity()).expect("cast");
    assert!(hit.is_none());
}

#[test]
fn layer_raycast_picks_nearest_body() {
    let bodies = vec![
        ColliderBody::new(unit_sphere(), TransformQvvs::from_position(Vec3::new(0.0, 0.0, 20.0)), EntityId(1)),
        ColliderBody::new(unit_sphere(), TransformQvvs::from_position(Vec3::new(0.0, 0.0, 5.0)), EntityId(2)),
        ColliderBody::new(unit_sphere(), TransformQvvs::from_position(Vec3::new(0.0, 50.0, 5.0)), EntityId(3)),
    ];
    let layer =
        CollisionLayer::build(bodies, CollisionLayerSettings::default(), 1, &SerialExecutor).expect("layer");
    let (hit, info) = layer
        .raycast(&Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0)))
        .expect("hit");
    assert_eq!(info.entity, EntityId(2));
    assert!((hit.distance - 4.0).abs() < 1e-4);
    assert_eq!(info.world_index, 1);
}

#[test]
fn ray_through_unit_box_reports_plus_x_face() {
    let b: Collider = BoxCollider::new(Vec3::ZERO, Vec3::ONE).into();
    let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(-5.0, 0.0, 0.0));
    let hit = raycast(&ray, &b, &TransformQvvs::identity()).expect("hit");
    assert!(close(hit.normal, Vec3::UNIT_X, 1e-6));
    assert!((hit.distance - 4.0).abs() < 1e-5);
    assert!((hit.fraction - 0.4).abs() < 1e-6);
}

#[test]
fn random_sweeps_end_in_contact() {
    let mut rng = XorShift64::new(0xCA57);
    let shape = |rng: &mut XorShift64, pick: u64| -> Collider {
        match pick % 4 {
            0 => SphereCollider::new(Vec3::ZERO, rng.range(0.2, 1.5)).into(),
            1 => CapsuleCollider::new(
                Vec3::new(0.0, -rng.range(0.1, 1.0), 0.0),
                Vec3::new(0.0, rng.range(0.1, 1.0), 0.0),
                rng.range(0.1, 0.8),
            )
            .into(),
            2 => BoxCollider::new(Vec3::ZERO, Vec3::new(rng.range(0.2, 1.5), rng.range(0.2, 1.5), rng.range(0.2, 1.5)))
                .into(),
            _ => hull_collider(Vec3::new(rng.range(0.2, 1.5), rng.range(0.2, 1.5), rng.range(0.2, 1.5))),
        }
    };
    for case in 0..200 {
        let pick = rng.next_u64();
        let caster = shape(&mut rng, pick);
        let pick = rng.next_u64();
        let target = shape(&mut rng, pick);
        let target_tf = TransformQvvs::new(
            Vec3::ZERO,
            Quat::from_axis_angle(rng.vec3(1.0), rng.range(0.0, std::f32::consts::TAU)),
            1.0,
            Vec3::ONE,
        );
        let dir = rng.vec3(1.0).normalize();
        if dir.length() < 0.5 {
            continue;
        }
        // The sweep passes through the target's center, so its midpoint overlaps.
        let start = TransformQvvs::new(
            dir * 10.0,
            Quat::from_axis_angle(rng.vec3(1.0), rng.range(0.0, std::f32::consts::TAU)),
            1.0,
            Vec3::ONE,
        );
        let end = -dir * 10.0;
        let hit = collider_cast(&caster, &start, &end, &target, &target_tf)
            .expect("cast")
            .expect("a sweep through the target hits it");
        assert!(hit.distance > 0.0 && hit.distance < 10.0, "case {case}: {}", hit.distance);
        let at = start.with_position(start.position() - dir * hit.distance);
        let gap = distance_between(&caster, &at, &target, &target_tf, 1.0).expect("gap");
        assert!(gap.distance.abs() < 5e-3, "case {case}: gap {}", gap.distance);

        let short_end = start.position() - dir * (hit.distance - 0.5);
        let short = collider_cast(&caster, &start, &short_end, &target, &target_tf).expect("cast");
        assert!(short.is_none(), "case {case}: stopped short but hit");
    }
}
