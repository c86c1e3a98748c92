// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Narrow-phase queries against every body of a layer.
//!
//! Candidates come from the layer's bounds index; each one is tested with the
//! single-collider query. The nearest result wins and equal results go to the
//! lowest body index, so the answer does not depend on bucket order.

use warp_geom::{Aabb, Collider, ColliderKind, Ray, TransformQvvs, Vec3};

use super::cast::{collider_cast, ColliderCastResult};
use super::distance::{distance_between, DistanceResult};
use super::point::{point_distance, PointDistanceResult};
use super::raycast::{raycast, RaycastResult};
use crate::error::CollideError;
use crate::layer::{ArchetypeMask, ColliderBody, CollisionLayer, CollisionWorld, EntityId};

/// Which body of a layer a query result came from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerBodyInfo {
    /// Index into [`CollisionLayer::bodies`].
    pub body_index: usize,
    /// Index of the body in the build input.
    pub source_index: u32,
    /// Entity attached to the body.
    pub entity: EntityId,
    /// World bounds of the body.
    pub aabb: Aabb,
    /// World index of the layer.
    pub world_index: u32,
}

fn body_info(layer: &CollisionLayer, body_index: usize) -> Option<LayerBodyInfo> {
    Some(LayerBodyInfo {
        body_index,
        source_index: *layer.source_indices().get(body_index)?,
        entity: layer.bodies().get(body_index)?.entity,
        aabb: layer.get_aabb(body_index)?,
        world_index: layer.world_index(),
    })
}

/// Smallest `key` over the candidates; the lowest index breaks ties.
fn nearest<R>(
    layer: &CollisionLayer,
    candidates: impl Iterator<Item = usize>,
    mut eval: impl FnMut(&ColliderBody) -> Option<R>,
    key: impl Fn(&R) -> f32,
) -> Option<(R, LayerBodyInfo)> {
    let mut best: Option<(f32, usize, R)> = None;
    for index in candidates {
        let Some(body) = layer.bodies().get(index) else {
            continue;
        };
        let Some(result) = eval(body) else {
            continue;
        };
        let k = key(&result);
        let better = best
            .as_ref()
            .is_none_or(|(bk, bi, _)| k < *bk || (k.to_bits() == bk.to_bits() && index < *bi));
        if better {
            best = Some((k, index, result));
        }
    }
    let (_, index, result) = best?;
    Some((result, body_info(layer, index)?))
}

fn cast_bounds(caster: &Collider, start: &TransformQvvs, end_position: &Vec3) -> Aabb {
    let from = caster.aabb(start);
    let to = caster.aabb(&start.with_position(*end_position));
    from.union(&to)
}

fn check_castable(caster: &Collider) -> Result<(), CollideError> {
    let kind = caster.kind();
    if matches!(kind, ColliderKind::TriangleMesh | ColliderKind::Terrain) {
        return Err(CollideError::UnsupportedCast { caster: kind });
    }
    Ok(())
}

fn nearest_cast(
    layer: &CollisionLayer,
    candidates: impl Iterator<Item = usize>,
    caster: &Collider,
    start: &TransformQvvs,
    end_position: &Vec3,
) -> Result<Option<(ColliderCastResult, LayerBodyInfo)>, CollideError> {
    check_castable(caster)?;
    let mut failure = None;
    let hit = nearest(
        layer,
        candidates,
        |body| match collider_cast(caster, start, end_position, &body.collider, &body.transform) {
            Ok(hit) => hit,
            Err(err) => {
                failure.get_or_insert(err);
                None
            }
        },
        |hit| hit.distance,
    );
    failure.map_or(Ok(hit), Err)
}

impl CollisionLayer {
    /// Nearest body hit by `ray`.
    pub fn raycast(&self, ray: &Ray) -> Option<(RaycastResult, LayerBodyInfo)> {
        nearest(
            self,
            self.find_overlaps(&ray.aabb()),
            |body| raycast(ray, &body.collider, &body.transform),
            |hit| hit.fraction,
        )
    }

    /// Any body hit by `ray`; stops at the first hit found.
    pub fn raycast_any(&self, ray: &Ray) -> Option<(RaycastResult, LayerBodyInfo)> {
        self.find_overlaps(&ray.aabb()).find_map(|index| {
            let body = self.bodies().get(index)?;
            let hit = raycast(ray, &body.collider, &body.transform)?;
            Some((hit, body_info(self, index)?))
        })
    }

    /// Body whose surface is nearest to `point`, within `max_distance`.
    pub fn point_distance(&self, point: &Vec3, max_distance: f32) -> Option<(PointDistanceResult, LayerBodyInfo)> {
        let query = Aabb::from_center_half_extents(*point, Vec3::splat(max_distance));
        nearest(
            self,
            self.find_overlaps(&query),
            |body| point_distance(point, &body.collider, &body.transform, max_distance),
            |hit| hit.distance,
        )
    }

    /// Body nearest to `collider`, within `max_distance`. The layer body is
    /// side B of the result.
    pub fn distance_between(
        &self,
        collider: &Collider,
        transform: &TransformQvvs,
        max_distance: f32,
    ) -> Option<(DistanceResult, LayerBodyInfo)> {
        let query = collider.aabb(transform).inflate(max_distance);
        nearest(
            self,
            self.find_overlaps(&query),
            |body| distance_between(collider, transform, &body.collider, &body.transform, max_distance),
            |hit| hit.distance,
        )
    }

    /// First body `caster` touches while moving from `start` to
    /// `end_position`.
    ///
    /// # Errors
    /// [`CollideError::UnsupportedCast`] for triangle mesh or terrain casters.
    pub fn collider_cast(
        &self,
        caster: &Collider,
        start: &TransformQvvs,
        end_position: &Vec3,
    ) -> Result<Option<(ColliderCastResult, LayerBodyInfo)>, CollideError> {
        let query = cast_bounds(caster, start, end_position);
        nearest_cast(self, self.find_overlaps(&query), caster, start, end_position)
    }
}

impl CollisionWorld {
    /// [`CollisionLayer::raycast`] over the archetypes in `mask`.
    pub fn raycast_filtered(&self, ray: &Ray, mask: &ArchetypeMask) -> Option<(RaycastResult, LayerBodyInfo)> {
        nearest(
            self.layer(),
            self.find_overlaps_filtered(&ray.aabb(), mask),
            |body| raycast(ray, &body.collider, &body.transform),
            |hit| hit.fraction,
        )
    }

    /// [`CollisionLayer::point_distance`] over the archetypes in `mask`.
    pub fn point_distance_filtered(
        &self,
        point: &Vec3,
        max_distance: f32,
        mask: &ArchetypeMask,
    ) -> Option<(PointDistanceResult, LayerBodyInfo)> {
        let query = Aabb::from_center_half_extents(*point, Vec3::splat(max_distance));
        nearest(
            self.layer(),
            self.find_overlaps_filtered(&query, mask),
            |body| point_distance(point, &body.collider, &body.transform, max_distance),
            |hit| hit.distance,
        )
    }

    /// [`CollisionLayer::distance_between`] over the archetypes in `mask`.
    pub fn distance_between_filtered(
        &self,
        collider: &Collider,
        transform: &TransformQvvs,
        max_distance: f32,
        mask: &ArchetypeMask,
    ) -> Option<(DistanceResult, LayerBodyInfo)> {
        let query = collider.aabb(transform).inflate(max_distance);
        nearest(
            self.layer(),
            self.find_overlaps_filtered(&query, mask),
            |body| distance_between(collider, transform, &body.collider, &body.transform, max_distance),
            |hit| hit.distance,
        )
    }

    /// [`CollisionLayer::collider_cast`] over the archetypes in `mask`.
    ///
    /// # Errors
    /// [`CollideError::UnsupportedCast`] for triangle mesh or terrain casters.
    pub fn collider_cast_filtered(
        &self,
        caster: &Collider,
        start: &TransformQvvs,
        end_position: &Vec3,
        mask: &ArchetypeMask,
    ) -> Result<Option<(ColliderCastResult, LayerBodyInfo)>, CollideError> {
        let query = cast_bounds(caster, start, end_position);
        nearest_cast(
            self.layer(),
            self.find_overlaps_filtered(&query, mask),
            caster,
            start,
            end_position,
        )
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::exec::SerialExecutor;
    use crate::layer::{CollisionLayerSettings, WorldBody};
    use warp_geom::shapes::{BoxCollider, SphereCollider};

    fn sphere_at(x: f32, entity: u64) -> ColliderBody {
        ColliderBody::new(
            SphereCollider::new(Vec3::ZERO, 1.0),
            TransformQvvs::from_position(Vec3::new(x, 0.0, 0.0)),
            EntityId(entity),
        )
    }

    fn row() -> CollisionLayer {
        let bodies = vec![sphere_at(20.0, 10), sphere_at(5.0, 11), sphere_at(-30.0, 12), sphere_at(5.0, 13)];
        CollisionLayer::build(bodies, CollisionLayerSettings::default(), 3, &SerialExecutor).expect("layer")
    }

    #[test]
    fn raycast_picks_nearest_and_lowest_index_on_ties() {
        let layer = row();
        let (hit, info) = layer
            .raycast(&Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0)))
            .expect("hit");
        assert!((hit.distance - 14.0).abs() < 1e-4);
        assert!(matches!(info.source_index, 1 | 3));
        let twin = layer
            .source_indices()
            .iter()
            .position(|&s| s == 1 + 3 - info.source_index)
            .expect("twin");
        assert!(info.body_index < twin);
        assert_eq!(info.world_index, 3);
    }

    #[test]
    fn raycast_any_finds_a_hit_on_the_ray() {
        let layer = row();
        let (hit, info) = layer
            .raycast_any(&Ray::new(Vec3::new(-40.0, 0.0, 0.0), Vec3::new(40.0, 0.0, 0.0)))
            .expect("hit");
        assert!(hit.fraction > 0.0);
        assert!(layer.bodies()[info.body_index].entity.0 >= 10);
        assert!(layer.raycast_any(&Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 5.0, 0.0))).is_none());
    }

    #[test]
    fn point_and_collider_distance_use_max_distance() {
        let layer = row();
        let (hit, info) = layer.point_distance(&Vec3::new(-27.0, 0.0, 0.0), 5.0).expect("hit");
        assert_eq!(info.entity, EntityId(12));
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!(layer.point_distance(&Vec3::new(-27.0, 0.0, 0.0), 1.0).is_none());

        let probe: Collider = BoxCollider::new(Vec3::ZERO, Vec3::splat(0.5)).into();
        let (gap, info) = layer
            .distance_between(&probe, &TransformQvvs::from_position(Vec3::new(17.0, 0.0, 0.0)), 10.0)
            .expect("gap");
        assert_eq!(info.entity, EntityId(10));
        assert!((gap.distance - 1.5).abs() < 1e-4);
    }

    #[test]
    fn sweep_reports_first_body_touched() {
        let layer = row();
        let caster: Collider = SphereCollider::new(Vec3::ZERO, 0.5).into();
        let (hit, info) = layer
            .collider_cast(
                &caster,
                &TransformQvvs::from_position(Vec3::new(40.0, 0.0, 0.0)),
                &Vec3::new(-40.0, 0.0, 0.0),
            )
            .expect("cast")
            .expect("hit");
        assert_eq!(info.entity, EntityId(10));
        assert!((hit.distance - 18.5).abs() < 1e-4);
    }

    #[test]
    fn filtered_queries_skip_masked_out_archetypes() {
        let bodies = vec![
            WorldBody { body: sphere_at(5.0, 1), archetype: 7 },
            WorldBody { body: sphere_at(10.0, 2), archetype: 9 },
        ];
        let world = CollisionWorld::build(bodies, CollisionLayerSettings::default(), 1, &SerialExecutor)
            .expect("world");
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0));
        let (_, info) = world.raycast_filtered(&ray, &world.mask_all()).expect("all");
        assert_eq!(info.entity, EntityId(1));
        let (_, info) = world.raycast_filtered(&ray, &world.mask_for_keys(&[9])).expect("nine");
        assert_eq!(info.entity, EntityId(2));
        assert!(world
            .point_distance_filtered(&Vec3::new(5.0, 0.0, 0.0), 1.0, &ArchetypeMask::empty())
            .is_none());
    }
}
