// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Height-field terrain.
//!
//! Heights are `i16` samples on a regular grid of `(quads_x + 1) × (quads_z + 1)`
//! vertices at unit spacing in unscaled space, row-major with x fastest. Quads
//! are grouped into 8×8 patches that record their height range. Queries reject
//! whole patches by height, then build a 64-bit mask of the patch's quads whose
//! footprint and height range overlap the query, and only triangulate those.

use std::sync::Arc;

use crate::error::GeomError;
use crate::math::Vec3;
use crate::shapes::convex::scaled_aabb;
use crate::shapes::primitives::TriangleCollider;
use crate::types::aabb::Aabb;

/// Quads per patch edge.
pub const PATCH_QUADS: u32 = 8;

/// Height range of one patch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TerrainPatch {
    /// Lowest sample touched by the patch.
    pub min_height: i16,
    /// Highest sample touched by the patch.
    pub max_height: i16,
}

/// Immutable height grid shared between terrain colliders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainBlob {
    quads_x: u32,
    quads_z: u32,
    heights: Vec<i16>,
    /// Per quad `(min, max)` of its four corners.
    quad_ranges: Vec<(i16, i16)>,
    patches_x: u32,
    patches: Vec<TerrainPatch>,
}

impl TerrainBlob {
    /// Builds terrain from a height grid.
    ///
    /// # Errors
    /// [`GeomError::InvalidBlob`] when either quad count is zero or `heights`
    /// does not hold `(quads_x + 1) * (quads_z + 1)` samples.
    pub fn new(quads_x: u32, quads_z: u32, heights: Vec<i16>) -> Result<Self, GeomError> {
        if quads_x == 0 || quads_z == 0 {
            return Err(GeomError::InvalidBlob("terrain needs at least one quad per axis"));
        }
        let expected = (quads_x as usize + 1) * (quads_z as usize + 1);
        if heights.len() != expected {
            return Err(GeomError::InvalidBlob("terrain height count does not match quad counts"));
        }
        let vx = quads_x as usize + 1;
        let mut quad_ranges = Vec::with_capacity(quads_x as usize * quads_z as usize);
        for z in 0..quads_z as usize {
            for x in 0..quads_x as usize {
                let corners = [
                    heights[z * vx + x],
                    heights[z * vx + x + 1],
                    heights[(z + 1) * vx + x],
                    heights[(z + 1) * vx + x + 1],
                ];
                let lo = corners.iter().copied().min().unwrap_or(0);
                let hi = corners.iter().copied().max().unwrap_or(0);
                quad_ranges.push((lo, hi));
            }
        }
        let patches_x = quads_x.div_ceil(PATCH_QUADS);
        let patches_z = quads_z.div_ceil(PATCH_QUADS);
        let mut patches = Vec::with_capacity((patches_x * patches_z) as usize);
        for pz in 0..patches_z {
            for px in 0..patches_x {
                let mut patch = TerrainPatch {
                    min_height: i16::MAX,
                    max_height: i16::MIN,
                };
                for qz in pz * PATCH_QUADS..((pz + 1) * PATCH_QUADS).min(quads_z) {
                    for qx in px * PATCH_QUADS..((px + 1) * PATCH_QUADS).min(quads_x) {
                        let (lo, hi) = quad_ranges[(qz * quads_x + qx) as usize];
                        patch.min_height = patch.min_height.min(lo);
                        patch.max_height = patch.max_height.max(hi);
                    }
                }
                patches.push(patch);
            }
        }
        Ok(Self {
            quads_x,
            quads_z,
            heights,
            quad_ranges,
            patches_x,
            patches,
        })
    }

    /// Quads along x.
    pub fn quads_x(&self) -> u32 {
        self.quads_x
    }

    /// Quads along z.
    pub fn quads_z(&self) -> u32 {
        self.quads_z
    }

    /// Raw height samples.
    pub fn heights(&self) -> &[i16] {
        &self.heights
    }

    /// Patch summaries, row-major with x fastest.
    pub fn patches(&self) -> &[TerrainPatch] {
        &self.patches
    }

    /// Sample at vertex `(x, z)`.
    pub fn height_at(&self, x: u32, z: u32) -> i16 {
        self.heights[(z * (self.quads_x + 1) + x) as usize]
    }

    /// Lowest and highest sample in the grid.
    pub fn height_range(&self) -> (i16, i16) {
        self.patches
            .iter()
            .fold((i16::MAX, i16::MIN), |(lo, hi), p| (lo.min(p.min_height), hi.max(p.max_height)))
    }

    /// Unscaled triangle `index` with heights offset by `base`.
    ///
    /// Triangle `2q` and `2q + 1` split quad `q = qz * quads_x + qx`.
    pub fn triangle(&self, index: u32, base: i32) -> Option<TriangleCollider> {
        let quad = index / 2;
        if quad >= self.quads_x * self.quads_z {
            return None;
        }
        let (qx, qz) = (quad % self.quads_x, quad / self.quads_x);
        let v = |x: u32, z: u32| {
            #[allow(clippy::cast_precision_loss)]
            Vec3::new(
                x as f32,
                (i32::from(self.height_at(x, z)) + base) as f32,
                z as f32,
            )
        };
        let (v00, v10, v01, v11) = (v(qx, qz), v(qx + 1, qz), v(qx, qz + 1), v(qx + 1, qz + 1));
        Some(if index % 2 == 0 {
            TriangleCollider::new(v00, v01, v11)
        } else {
            TriangleCollider::new(v00, v11, v10)
        })
    }

    /// Calls `visit(triangle_index)` for both triangles of every quad whose
    /// unscaled footprint and height range overlap `query`. `base` is added to
    /// every sample. Visits patch by patch, ascending within a patch.
    pub fn for_each_overlapping(&self, query: &Aabb, base: i32, mut visit: impl FnMut(u32)) {
        let (qmin, qmax) = (query.min(), query.max());
        if query.has_nan() || qmax.x() < 0.0 || qmax.z() < 0.0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let (extent_x, extent_z) = (self.quads_x as f32, self.quads_z as f32);
        if qmin.x() > extent_x || qmin.z() > extent_z {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let quad_span = |lo: f32, hi: f32, quads: u32| {
            // Inclusive: a query edge on a grid line touches both neighbours.
            let first = (lo.ceil() - 1.0).max(0.0) as u32;
            let last = (hi.floor().max(0.0) as u32).min(quads - 1);
            (first.min(quads - 1), last)
        };
        let (x0, x1) = quad_span(qmin.x(), qmax.x(), self.quads_x);
        let (z0, z1) = quad_span(qmin.z(), qmax.z(), self.quads_z);
        #[allow(clippy::cast_possible_truncation)]
        let y_lo = (qmin.y().floor() as i64).saturating_sub(i64::from(base)).clamp(i64::from(i16::MIN), i64::from(i16::MAX));
        #[allow(clippy::cast_possible_truncation)]
        let y_hi = (qmax.y().ceil() as i64).saturating_sub(i64::from(base)).clamp(i64::from(i16::MIN), i64::from(i16::MAX));

        for pz in z0 / PATCH_QUADS..=z1 / PATCH_QUADS {
            for px in x0 / PATCH_QUADS..=x1 / PATCH_QUADS {
                let patch = self.patches[(pz * self.patches_x + px) as usize];
                if i64::from(patch.max_height) < y_lo || i64::from(patch.min_height) > y_hi {
                    continue;
                }
                let mut mask = 0u64;
                for lz in 0..PATCH_QUADS {
                    let qz = pz * PATCH_QUADS + lz;
                    if qz < z0 || qz > z1 {
                        continue;
                    }
                    for lx in 0..PATCH_QUADS {
                        let qx = px * PATCH_QUADS + lx;
                        if qx < x0 || qx > x1 {
                            continue;
                        }
                        let (lo, hi) = self.quad_ranges[(qz * self.quads_x + qx) as usize];
                        if i64::from(hi) >= y_lo && i64::from(lo) <= y_hi {
                            mask |= 1u64 << (lz * PATCH_QUADS + lx);
                        }
                    }
                }
                while mask != 0 {
                    let bit = mask.trailing_zeros();
                    mask &= mask - 1;
                    let qx = px * PATCH_QUADS + bit % PATCH_QUADS;
                    let qz = pz * PATCH_QUADS + bit / PATCH_QUADS;
                    let quad = qz * self.quads_x + qx;
                    visit(quad * 2);
                    visit(quad * 2 + 1);
                }
            }
        }
    }
}

/// Terrain instance with a per-axis scale and integer height offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainCollider {
    /// Shared height grid.
    pub blob: Arc<TerrainBlob>,
    /// Per-axis scale applied after the height offset.
    pub scale: Vec3,
    /// Added to every height sample before scaling.
    pub base_height_offset: i32,
}

impl TerrainCollider {
    /// Unscaled, unoffset instance of `blob`.
    pub fn new(blob: Arc<TerrainBlob>) -> Self {
        Self {
            blob,
            scale: Vec3::ONE,
            base_height_offset: 0,
        }
    }

    /// Bakes `scale * stretch` into the scale vector.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        Self {
            blob: Arc::clone(&self.blob),
            scale: self.scale.mul_elem(&(stretch * scale)),
            base_height_offset: self.base_height_offset,
        }
    }

    /// Scaled triangle `index`.
    pub fn triangle(&self, index: u32) -> Option<TriangleCollider> {
        self.blob
            .triangle(index, self.base_height_offset)
            .map(|t| t.scaled(1.0, self.scale))
    }

    /// Visits every scaled triangle of every quad that may overlap `query`
    /// (collider-local, scaled space).
    pub fn for_each_triangle_in(&self, query: &Aabb, mut visit: impl FnMut(u32, TriangleCollider)) {
        let inverse = Vec3::ONE.div_elem(&self.scale);
        let unscaled = scaled_aabb(query, &inverse);
        self.blob
            .for_each_overlapping(&unscaled, self.base_height_offset, |index| {
                if let Some(t) = self.triangle(index) {
                    visit(index, t);
                }
            });
    }

    /// Scaled local bounds.
    pub fn local_aabb(&self) -> Aabb {
        let (lo, hi) = self.blob.height_range();
        #[allow(clippy::cast_precision_loss)]
        let unscaled = Aabb::new(
            Vec3::new(0.0, (i32::from(lo) + self.base_height_offset) as f32, 0.0),
            Vec3::new(
                self.blob.quads_x as f32,
                (i32::from(hi) + self.base_height_offset) as f32,
                self.blob.quads_z as f32,
            ),
        );
        scaled_aabb(&unscaled, &self.scale)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn ramp(quads: u32) -> TerrainBlob {
        let n = (quads + 1) as usize;
        let heights = (0..n * n)
            .map(|i| i16::try_from(i % n).unwrap_or(0))
            .collect();
        TerrainBlob::new(quads, quads, heights).expect("valid ramp")
    }

    #[test]
    fn patch_ranges_use_true_max() {
        let blob = ramp(10);
        assert_eq!(blob.patches().len(), 4);
        assert_eq!(blob.patches()[0], TerrainPatch { min_height: 0, max_height: 8 });
        assert_eq!(blob.patches()[1], TerrainPatch { min_height: 8, max_height: 10 });
    }

    #[test]
    fn culling_matches_brute_force() {
        let terrain = TerrainCollider::new(Arc::new(ramp(20)));
        let query = Aabb::new(Vec3::new(3.5, 9.0, 2.0), Vec3::new(12.2, 11.0, 9.5));
        let mut got = Vec::new();
        terrain.for_each_triangle_in(&query, |i, _| got.push(i));
        got.sort_unstable();
        let expected: Vec<u32> = (0..20 * 20 * 2)
            .filter(|&i| {
                let quad = i / 2;
                match (terrain.triangle(quad * 2), terrain.triangle(quad * 2 + 1)) {
                    (Some(a), Some(b)) => a.local_aabb().union(&b.local_aabb()).overlaps(&query),
                    _ => false,
                }
            })
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn query_outside_grid_visits_nothing() {
        let terrain = TerrainCollider::new(Arc::new(ramp(4)));
        let mut count = 0;
        terrain.for_each_triangle_in(
            &Aabb::new(Vec3::splat(-10.0), Vec3::splat(-5.0)),
            |_, _| count += 1,
        );
        assert_eq!(count, 0);
    }

    #[test]
    fn local_aabb_applies_offset_and_scale() {
        let mut terrain = TerrainCollider::new(Arc::new(ramp(4))).scaled(2.0, Vec3::ONE);
        terrain.base_height_offset = 1;
        let b = terrain.local_aabb();
        assert_eq!(b.min(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(b.max(), Vec3::new(8.0, 10.0, 8.0));
    }
}
