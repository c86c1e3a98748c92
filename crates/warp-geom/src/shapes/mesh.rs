// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Triangle meshes with an interval tree over triangle bounds.

use std::sync::Arc;

use crate::broad::interval_tree::{build_nodes, IntervalNode, IntervalTree};
use crate::error::GeomError;
use crate::math::Vec3;
use crate::shapes::convex::scaled_aabb;
use crate::shapes::primitives::TriangleCollider;
use crate::types::aabb::Aabb;

/// Immutable triangle soup with an x-axis interval tree over triangle bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMeshBlob {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    /// Tree positions map to `sorted_triangles[position]`.
    tree: Vec<IntervalNode>,
    sorted_triangles: Vec<u32>,
    /// `(ymin, ymax, zmin, zmax)` per sorted position.
    sorted_yz: Vec<[f32; 4]>,
    local_aabb: Aabb,
}

impl TriMeshBlob {
    /// Builds a mesh from shared vertices and index triples.
    ///
    /// # Errors
    /// [`GeomError::InvalidBlob`] for an empty or non-finite mesh;
    /// [`GeomError::IndexOutOfRange`] when a triangle references a missing vertex.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, GeomError> {
        if triangles.is_empty() {
            return Err(GeomError::InvalidBlob("triangle mesh needs at least one triangle"));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(GeomError::InvalidBlob("mesh vertices must be finite"));
        }
        if let Some(&bad) = triangles.iter().flatten().find(|&&i| i as usize >= vertices.len()) {
            return Err(GeomError::IndexOutOfRange {
                index: bad as usize,
                len: vertices.len(),
            });
        }
        u32::try_from(triangles.len())
            .map_err(|_| GeomError::InvalidBlob("too many triangles"))?;

        let bounds: Vec<Aabb> = triangles
            .iter()
            .map(|t| TriangleCollider::new(vertices[t[0] as usize], vertices[t[1] as usize], vertices[t[2] as usize]).local_aabb())
            .collect();
        let mut order: Vec<u32> = (0..triangles.len())
            .map(|i| u32::try_from(i).unwrap_or(u32::MAX))
            .collect();
        // Stable, and xmin values are finite, so the order is canonical.
        order.sort_by(|&a, &b| bounds[a as usize].min().x().total_cmp(&bounds[b as usize].min().x()));

        let sorted: Vec<(f32, f32)> = order
            .iter()
            .map(|&t| (bounds[t as usize].min().x(), bounds[t as usize].max().x()))
            .collect();
        let sorted_yz = order
            .iter()
            .map(|&t| {
                let b = &bounds[t as usize];
                [b.min().y(), b.max().y(), b.min().z(), b.max().z()]
            })
            .collect();
        let mut tree = vec![IntervalNode::default(); sorted.len()];
        build_nodes(&sorted, &mut tree);
        let local_aabb = bounds
            .iter()
            .skip(1)
            .fold(bounds[0], |acc, b| acc.union(b));
        Ok(Self {
            vertices,
            triangles,
            tree,
            sorted_triangles: order,
            sorted_yz,
            local_aabb,
        })
    }

    /// Shared vertices.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Index triples.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Unscaled triangle `index`.
    pub fn triangle(&self, index: u32) -> Option<TriangleCollider> {
        let t = self.triangles.get(index as usize)?;
        Some(TriangleCollider::new(
            self.vertices[t[0] as usize],
            self.vertices[t[1] as usize],
            self.vertices[t[2] as usize],
        ))
    }

    /// Unscaled bounds.
    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    /// Calls `visit(triangle_index)` for every triangle whose unscaled bounds
    /// overlap `query`, in ascending triangle-xmin order.
    pub fn for_each_overlapping(&self, query: &Aabb, mut visit: impl FnMut(u32)) {
        let (qmin, qmax) = (query.min(), query.max());
        for pos in IntervalTree::new(&self.tree).overlaps(qmin.x(), qmax.x()) {
            let yz = self.sorted_yz[pos as usize];
            if yz[0] <= qmax.y() && yz[1] >= qmin.y() && yz[2] <= qmax.z() && yz[3] >= qmin.z() {
                visit(self.sorted_triangles[pos as usize]);
            }
        }
    }
}

/// Triangle mesh instance with a per-axis scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMeshCollider {
    /// Shared mesh.
    pub blob: Arc<TriMeshBlob>,
    /// Per-axis scale applied to mesh vertices.
    pub scale: Vec3,
}

impl TriMeshCollider {
    /// Unscaled instance of `blob`.
    pub fn new(blob: Arc<TriMeshBlob>) -> Self {
        Self {
            blob,
            scale: Vec3::ONE,
        }
    }

    /// Bakes `scale * stretch` into the scale vector.
    pub fn scaled(&self, scale: f32, stretch: Vec3) -> Self {
        Self {
            blob: Arc::clone(&self.blob),
            scale: self.scale.mul_elem(&(stretch * scale)),
        }
    }

    /// Scaled triangle `index`.
    pub fn triangle(&self, index: u32) -> Option<TriangleCollider> {
        self.blob.triangle(index).map(|t| t.scaled(1.0, self.scale))
    }

    /// Visits every scaled triangle whose bounds may overlap `query`
    /// (collider-local, scaled space).
    pub fn for_each_triangle_in(&self, query: &Aabb, mut visit: impl FnMut(u32, TriangleCollider)) {
        let inverse = Vec3::ONE.div_elem(&self.scale);
        let unscaled = scaled_aabb(query, &inverse);
        self.blob.for_each_overlapping(&unscaled, |index| {
            if let Some(t) = self.triangle(index) {
                visit(index, t);
            }
        });
    }

    /// Scaled local bounds.
    pub fn local_aabb(&self) -> Aabb {
        scaled_aabb(&self.blob.local_aabb, &self.scale)
    }
}
