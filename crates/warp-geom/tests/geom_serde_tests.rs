// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::expect_used)]
#![cfg(feature = "serde")]

use warp_geom::shapes::SphereCollider;
use warp_geom::{Aabb, TransformQvvs, Vec3};

#[test]
fn value_types_round_trip_through_json() {
    let aabb = Aabb::new(Vec3::splat(-2.0), Vec3::new(1.0, 2.0, 3.0));
    let text = serde_json::to_string(&aabb).expect("serialize aabb");
    let back: Aabb = serde_json::from_str(&text).expect("deserialize aabb");
    assert_eq!(back, aabb);

    let t = TransformQvvs::from_position(Vec3::new(4.0, 5.0, 6.0));
    let text = serde_json::to_string(&t).expect("serialize transform");
    assert_eq!(serde_json::from_str::<TransformQvvs>(&text).expect("deserialize"), t);

    let s = SphereCollider::new(Vec3::UNIT_Y, 0.5);
    let text = serde_json::to_string(&s).expect("serialize sphere");
    assert_eq!(serde_json::from_str::<SphereCollider>(&text).expect("deserialize"), s);
}
