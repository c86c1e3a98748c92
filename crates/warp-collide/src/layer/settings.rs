// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use warp_geom::{Aabb, Vec3};

use crate::error::CollideError;

/// Upper bound on grid cells; keeps bucket tables small and indices in `u32`.
pub const MAX_GRID_CELLS: u32 = 1 << 20;

/// Spatial grid configuration for a collision layer.
///
/// The grid covers `world_aabb` with `world_subdivisions_per_axis` cells per
/// axis. Bodies that fit inside one cell land in that cell's bucket; all
/// others (including bodies outside the world bounds) land in the cross
/// bucket. Bucket count depends only on these settings, never on content.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionLayerSettings {
    /// Region covered by grid cells.
    pub world_aabb: Aabb,
    /// Cells per axis (x, y, z).
    pub world_subdivisions_per_axis: [u32; 3],
}

impl Default for CollisionLayerSettings {
    fn default() -> Self {
        Self {
            world_aabb: Aabb::new(Vec3::splat(-1000.0), Vec3::splat(1000.0)),
            world_subdivisions_per_axis: [2, 2, 2],
        }
    }
}

impl CollisionLayerSettings {
    /// Checks the grid is usable.
    ///
    /// # Errors
    /// [`CollideError::InvalidSettings`] for a zero subdivision, too many
    /// cells, or world bounds that are non-finite or empty on some axis.
    pub fn validate(&self) -> Result<(), CollideError> {
        let [x, y, z] = self.world_subdivisions_per_axis;
        if x == 0 || y == 0 || z == 0 {
            return Err(CollideError::InvalidSettings(
                "world subdivisions must be at least 1 per axis",
            ));
        }
        let cells = u64::from(x) * u64::from(y) * u64::from(z);
        if cells > u64::from(MAX_GRID_CELLS) {
            return Err(CollideError::InvalidSettings("too many grid cells"));
        }
        let (min, max) = (self.world_aabb.min(), self.world_aabb.max());
        if !min.is_finite() || !max.is_finite() {
            return Err(CollideError::InvalidSettings("world bounds must be finite"));
        }
        if (0..3).any(|axis| min.component(axis) >= max.component(axis)) {
            return Err(CollideError::InvalidSettings(
                "world bounds must have positive extent on every axis",
            ));
        }
        Ok(())
    }

    /// Number of grid cells.
    pub fn cell_count(&self) -> u32 {
        let [x, y, z] = self.world_subdivisions_per_axis;
        x * y * z
    }

    /// Buckets in a layer: one per cell, the cross bucket, and the NaN bucket.
    pub fn bucket_count(&self) -> u32 {
        self.cell_count() + 2
    }

    /// Index of the cross (catch-all) bucket.
    pub fn cross_bucket(&self) -> u32 {
        self.cell_count()
    }

    /// Index of the NaN bucket; never visited by queries.
    pub fn nan_bucket(&self) -> u32 {
        self.cell_count() + 1
    }

    pub(crate) fn cell_stride(&self) -> Vec3 {
        let [x, y, z] = self.world_subdivisions_per_axis;
        #[allow(clippy::cast_precision_loss)]
        let subdivisions = Vec3::new(x as f32, y as f32, z as f32);
        (self.world_aabb.max() - self.world_aabb.min()).div_elem(&subdivisions)
    }

    /// Clamped cell coordinates containing `point`.
    pub(crate) fn cell_coords(&self, point: &Vec3) -> [u32; 3] {
        let stride = self.cell_stride();
        let local = (*point - self.world_aabb.min()).div_elem(&stride);
        let mut out = [0u32; 3];
        for (axis, slot) in out.iter_mut().enumerate() {
            let last = self.world_subdivisions_per_axis[axis] - 1;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let cell = local.component(axis).floor().clamp(0.0, last as f32) as u32;
            *slot = cell;
        }
        out
    }

    pub(crate) fn cell_index(&self, coords: [u32; 3]) -> u32 {
        let [_, ny, nz] = self.world_subdivisions_per_axis;
        coords[0] * ny * nz + coords[1] * nz + coords[2]
    }

    /// Bucket for a body with bounds `aabb`.
    pub fn bucket_for(&self, aabb: &Aabb) -> u32 {
        if aabb.has_nan() {
            return self.nan_bucket();
        }
        let lo = self.cell_coords(&aabb.min());
        let hi = self.cell_coords(&aabb.max());
        if lo == hi {
            self.cell_index(lo)
        } else {
            self.cross_bucket()
        }
    }
}
