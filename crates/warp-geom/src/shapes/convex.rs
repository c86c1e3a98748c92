// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Convex hulls: vertices, polygon faces and outward face planes.

use std::sync::Arc;

use crate::error::GeomError;
use crate::math::{Vec3, EPSILON};
use crate::types::aabb::Aabb;

/// One planar face of a convex hull.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConvexFace {
    /// Outward unit normal.
    pub normal: Vec3,
    /// Plane offset: points on the face satisfy `normal · p == distance`.
    pub distance: f32,
    start: u32,
    count: u32,
}

/// Immutable convex hull shared between colliders.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexBlob {
    vertices: Vec<Vec3>,
    faces: Vec<ConvexFace>,
    face_vertex_indices: Vec<u32>,
    local_aabb: Aabb,
}

impl ConvexBlob {
    /// Builds a hull from vertices and faces.
    ///
    /// Each face lists vertex indices counter-clockwise when viewed from
    /// outside. Face planes are derived with Newell's method.
    ///
    /// # Errors
    /// [`GeomError::InvalidBlob`] for fewer than four vertices or faces, a face
    /// with fewer than three vertices, a degenerate face, or non-finite input;
    /// [`GeomError::IndexOutOfRange`] when a face references a missing vertex.
    pub fn new(vertices: Vec<Vec3>, faces: &[Vec<u32>]) -> Result<Self, GeomError> {
        if vertices.len() < 4 {
            return Err(GeomError::InvalidBlob("convex hull needs at least 4 vertices"));
        }
        if faces.len() < 4 {
            return Err(GeomError::InvalidBlob("convex hull needs at least 4 faces"));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(GeomError::InvalidBlob("convex vertices must be finite"));
        }
        let mut out_faces = Vec::with_capacity(faces.len());
        let mut face_vertex_indices = Vec::new();
        for face in faces {
            if face.len() < 3 {
                return Err(GeomError::InvalidBlob("convex face needs at least 3 vertices"));
            }
            let mut newell = Vec3::ZERO;
            let mut centroid = Vec3::ZERO;
            for (k, &i) in face.iter().enumerate() {
                let j = face[(k + 1) % face.len()];
                let a = *vertices.get(i as usize).ok_or(GeomError::IndexOutOfRange {
                    index: i as usize,
                    len: vertices.len(),
                })?;
                let b = *vertices.get(j as usize).ok_or(GeomError::IndexOutOfRange {
                    index: j as usize,
                    len: vertices.len(),
                })?;
                newell += Vec3::new(
                    (a.y() - b.y()) * (a.z() + b.z()),
                    (a.z() - b.z()) * (a.x() + b.x()),
                    (a.x() - b.x()) * (a.y() + b.y()),
                );
                centroid += a;
            }
            if newell.length() <= EPSILON {
                return Err(GeomError::InvalidBlob("degenerate convex face"));
            }
            let normal = newell.normalize();
            #[allow(clippy::cast_precision_loss)]
            let centroid = centroid / face.len() as f32;
            let start = u32::try_from(face_vertex_indices.len())
                .map_err(|_| GeomError::InvalidBlob("too many convex face indices"))?;
            let count = u32::try_from(face.len())
                .map_err(|_| GeomError::InvalidBlob("convex face too large"))?;
            face_vertex_indices.extend_from_slice(face);
            out_faces.push(ConvexFace {
                normal,
                distance: normal.dot(&centroid),
                start,
                count,
            });
        }
        let local_aabb = Aabb::from_points(&vertices)
            .ok_or(GeomError::InvalidBlob("convex hull needs vertices"))?;
        Ok(Self {
            vertices,
            faces: out_faces,
            face_vertex_indices,
            local_aabb,
        })
    }

    /// Axis-aligned box as a hull (8 vertices, 6 faces).
    pub fn cuboid(half_size: Vec3) -> Self {
        let h = half_size.abs();
        let vertices: Vec<Vec3> = (0..8u8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -h.x() } else { h.x() },
                    if i & 2 == 0 { -h.y() } else { h.y() },
                    if i & 4 == 0 { -h.z() } else { h.z() },
                )
            })
            .collect();
        let face_lists: [[u32; 4]; 6] = [
            [0, 4, 6, 2],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 2, 3, 1],
            [4, 5, 7, 6],
        ];
        let normals = [
            -Vec3::UNIT_X,
            Vec3::UNIT_X,
            -Vec3::UNIT_Y,
            Vec3::UNIT_Y,
            -Vec3::UNIT_Z,
            Vec3::UNIT_Z,
        ];
        let mut faces = Vec::with_capacity(6);
        let mut face_vertex_indices = Vec::with_capacity(24);
        for (k, (list, normal)) in face_lists.iter().zip(normals).enumerate() {
            faces.push(ConvexFace {
                normal,
                distance: h.dot(&normal.abs()),
                start: u32::try_from(k * 4).unwrap_or(0),
                count: 4,
            });
            face_vertex_indices.extend_from_slice(list);
        }
        Self {
            vertices,
            faces,
            face_vertex_indices,
            local_aabb: Aabb::new(-h, h),
        }
    }

    /// Hull vertices.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Hull faces.
    pub fn faces(&self) -> &[ConvexFace] {
        &self.faces
    }

    /// Vertex indices of `face`, counter-clockwise from outside.
    pub fn face_vertices(&self, face: &ConvexFace) -> &[u32] {
        let start = face.start as usize;
        &self.face_vertex_indices[start..start + face.count as usize]
    }

    /// Unscaled bounds.
    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }
}

/// Convex hull instance with a per-axis scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexCollider {
    /// Shared hull.
    pub blob: Arc<ConvexBlob>,
    /// Per-axis scale applied to the hull vertices.
    pub scale: Vec3,
}

impl ConvexCollider {
    /// Unscaled instance of `blob`.
    pub fn new(blob: Arc<ConvexBlob>) -> Self {
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

    /// Farthest scaled vertex along `direction`.
    pub fn support(&self, direction: &Vec3) -> Vec3 {
        let d = direction.mul_elem(&self.scale);
        let mut best = Vec3::ZERO;
        let mut best_dot = f32::NEG_INFINITY;
        for v in &self.blob.vertices {
            let dot = v.dot(&d);
            if dot > best_dot {
                best_dot = dot;
                best = *v;
            }
        }
        best.mul_elem(&self.scale)
    }

    /// Scaled local bounds.
    pub fn local_aabb(&self) -> Aabb {
        scaled_aabb(&self.blob.local_aabb, &self.scale)
    }
}

/// Bounds of `aabb` after multiplying every point by `scale` per axis.
pub fn scaled_aabb(aabb: &Aabb, scale: &Vec3) -> Aabb {
    let a = aabb.min().mul_elem(scale);
    let b = aabb.max().mul_elem(scale);
    Aabb::new(a.min_elem(&b), a.max_elem(&b))
}
