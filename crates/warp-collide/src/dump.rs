// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hex debug dumps of single narrow-phase queries.
//!
//! A dump captures every input of one query so a misbehaving case seen in a
//! running host can be pasted into a test and replayed. Records are
//! little-endian binary encoded as lowercase hex:
//!
//! ```text
//! magic "WCQD" | version u16 | query tag u8 | query fields
//! ```
//!
//! Colliders are written in full, blobs included. Encoding then decoding
//! then encoding again yields the same text.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, instrument};
use warp_geom::shapes::{
    BoxCollider, CapsuleCollider, CapsuleStretchMode, CompoundBlob, CompoundCollider, CompoundStretchMode,
    ConvexBlob, ConvexCollider, SphereCollider, SphereStretchMode, TerrainBlob, TerrainCollider, TriMeshBlob,
    TriMeshCollider, TriangleCollider,
};
use warp_geom::{Collider, ColliderKind, Quat, Ray, RigidTransform, TransformQvvs, Vec3};

use crate::error::{CollideError, DumpError};
use crate::query::{
    collider_cast, distance_between, point_distance, raycast, ColliderCastResult, DistanceResult,
    PointDistanceResult, RaycastResult,
};

const MAGIC: &[u8; 4] = b"WCQD";

/// Current record version.
pub const DUMP_VERSION: u16 = 1;

/// Inputs of one captured query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryDump {
    /// [`raycast`] inputs.
    Raycast {
        /// Ray in world space.
        ray: Ray,
        /// Target shape.
        collider: Collider,
        /// Target placement.
        transform: TransformQvvs,
    },
    /// [`point_distance`] inputs.
    PointDistance {
        /// Query point in world space.
        point: Vec3,
        /// Target shape.
        collider: Collider,
        /// Target placement.
        transform: TransformQvvs,
        /// Search radius.
        max_distance: f32,
    },
    /// [`distance_between`] inputs.
    Distance {
        /// First shape.
        a: Collider,
        /// First placement.
        a_transform: TransformQvvs,
        /// Second shape.
        b: Collider,
        /// Second placement.
        b_transform: TransformQvvs,
        /// Search radius.
        max_distance: f32,
    },
    /// [`collider_cast`] inputs.
    ColliderCast {
        /// Swept shape.
        caster: Collider,
        /// Placement at the start of the sweep.
        caster_start: TransformQvvs,
        /// Position at the end of the sweep.
        caster_end_position: Vec3,
        /// Target shape.
        target: Collider,
        /// Target placement.
        target_transform: TransformQvvs,
    },
}

/// Result of replaying a [`QueryDump`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Raycast result.
    Raycast(Option<RaycastResult>),
    /// Point distance result.
    PointDistance(Option<PointDistanceResult>),
    /// Distance result.
    Distance(Option<DistanceResult>),
    /// Collider cast result.
    ColliderCast(Option<ColliderCastResult>),
}

impl QueryDump {
    fn tag(&self) -> u8 {
        match self {
            Self::Raycast { .. } => 0,
            Self::PointDistance { .. } => 1,
            Self::Distance { .. } => 2,
            Self::ColliderCast { .. } => 3,
        }
    }

    /// Binary record.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_slice(MAGIC);
        buf.put_u16_le(DUMP_VERSION);
        buf.put_u8(self.tag());
        match self {
            Self::Raycast { ray, collider, transform } => {
                put_vec3(&mut buf, &ray.start());
                put_vec3(&mut buf, &ray.end());
                put_collider(&mut buf, collider);
                put_qvvs(&mut buf, transform);
            }
            Self::PointDistance {
                point,
                collider,
                transform,
                max_distance,
            } => {
                put_vec3(&mut buf, point);
                put_collider(&mut buf, collider);
                put_qvvs(&mut buf, transform);
                buf.put_f32_le(*max_distance);
            }
            Self::Distance {
                a,
                a_transform,
                b,
                b_transform,
                max_distance,
            } => {
                put_collider(&mut buf, a);
                put_qvvs(&mut buf, a_transform);
                put_collider(&mut buf, b);
                put_qvvs(&mut buf, b_transform);
                buf.put_f32_le(*max_distance);
            }
            Self::ColliderCast {
                caster,
                caster_start,
                caster_end_position,
                target,
                target_transform,
            } => {
                put_collider(&mut buf, caster);
                put_qvvs(&mut buf, caster_start);
                put_vec3(&mut buf, caster_end_position);
                put_collider(&mut buf, target);
                put_qvvs(&mut buf, target_transform);
            }
        }
        buf.freeze()
    }

    /// Hex text of [`Self::encode`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    /// Parses a binary record.
    ///
    /// # Errors
    /// [`CollideError::Dump`] for malformed records and
    /// [`CollideError::Geom`] when a captured blob fails validation.
    pub fn decode(bytes: &[u8]) -> Result<Self, CollideError> {
        let mut r = Reader { buf: bytes };
        if r.take(4)? != MAGIC {
            return Err(DumpError::BadMagic.into());
        }
        let version = r.u16()?;
        if version != DUMP_VERSION {
            return Err(DumpError::UnsupportedVersion(version).into());
        }
        let dump = match r.u8()? {
            0 => {
                let start = r.vec3()?;
                let end = r.vec3()?;
                Self::Raycast {
                    ray: Ray::new(start, end),
                    collider: r.collider()?,
                    transform: r.qvvs()?,
                }
            }
            1 => Self::PointDistance {
                point: r.vec3()?,
                collider: r.collider()?,
                transform: r.qvvs()?,
                max_distance: r.f32()?,
            },
            2 => Self::Distance {
                a: r.collider()?,
                a_transform: r.qvvs()?,
                b: r.collider()?,
                b_transform: r.qvvs()?,
                max_distance: r.f32()?,
            },
            3 => Self::ColliderCast {
                caster: r.collider()?,
                caster_start: r.qvvs()?,
                caster_end_position: r.vec3()?,
                target: r.collider()?,
                target_transform: r.qvvs()?,
            },
            tag => return Err(DumpError::UnknownTag { what: "query", tag }.into()),
        };
        if r.buf.has_remaining() {
            return Err(DumpError::TrailingBytes(r.buf.remaining()).into());
        }
        Ok(dump)
    }

    /// Parses hex text produced by [`Self::to_hex`]; surrounding whitespace
    /// is ignored.
    ///
    /// # Errors
    /// As [`Self::decode`], plus [`DumpError::Hex`] for invalid hex.
    pub fn from_hex(text: &str) -> Result<Self, CollideError> {
        let bytes = hex::decode(text.trim()).map_err(DumpError::from)?;
        Self::decode(&bytes)
    }

    /// Runs the captured query again.
    ///
    /// # Errors
    /// Whatever the query itself reports; only casts can fail.
    #[instrument(skip_all, fields(query = self.tag()))]
    pub fn replay(&self) -> Result<QueryOutcome, CollideError> {
        let outcome = match self {
            Self::Raycast { ray, collider, transform } => QueryOutcome::Raycast(raycast(ray, collider, transform)),
            Self::PointDistance {
                point,
                collider,
                transform,
                max_distance,
            } => QueryOutcome::PointDistance(point_distance(point, collider, transform, *max_distance)),
            Self::Distance {
                a,
                a_transform,
                b,
                b_transform,
                max_distance,
            } => QueryOutcome::Distance(distance_between(a, a_transform, b, b_transform, *max_distance)),
            Self::ColliderCast {
                caster,
                caster_start,
                caster_end_position,
                target,
                target_transform,
            } => QueryOutcome::ColliderCast(collider_cast(
                caster,
                caster_start,
                caster_end_position,
                target,
                target_transform,
            )?),
        };
        debug!(?outcome, "dump replayed");
        Ok(outcome)
    }
}

fn put_vec3(buf: &mut BytesMut, v: &Vec3) {
    for c in v.to_array() {
        buf.put_f32_le(c);
    }
}

fn put_quat(buf: &mut BytesMut, q: &Quat) {
    for c in q.to_array() {
        buf.put_f32_le(c);
    }
}

fn put_rigid(buf: &mut BytesMut, t: &RigidTransform) {
    put_quat(buf, &t.rotation());
    put_vec3(buf, &t.position());
}

fn put_qvvs(buf: &mut BytesMut, t: &TransformQvvs) {
    put_vec3(buf, &t.position());
    put_quat(buf, &t.rotation());
    buf.put_f32_le(t.scale());
    put_vec3(buf, &t.stretch());
}

fn put_len(buf: &mut BytesMut, len: usize) {
    buf.put_u32_le(u32::try_from(len).unwrap_or(u32::MAX));
}

fn put_collider(buf: &mut BytesMut, collider: &Collider) {
    buf.put_u8(collider.kind().as_u8());
    match collider {
        Collider::Sphere(s) => {
            put_vec3(buf, &s.center);
            buf.put_f32_le(s.radius);
            buf.put_u8(match s.stretch_mode {
                SphereStretchMode::StretchCenter => 0,
                SphereStretchMode::IgnoreStretch => 1,
            });
        }
        Collider::Capsule(c) => {
            put_vec3(buf, &c.point_a);
            put_vec3(buf, &c.point_b);
            buf.put_f32_le(c.radius);
            buf.put_u8(match c.stretch_mode {
                CapsuleStretchMode::StretchPoints => 0,
                CapsuleStretchMode::IgnoreStretch => 1,
            });
        }
        Collider::Box(b) => {
            put_vec3(buf, &b.center);
            put_vec3(buf, &b.half_size);
        }
        Collider::Triangle(t) => {
            for p in &t.points {
                put_vec3(buf, p);
            }
        }
        Collider::Convex(c) => {
            let blob = &c.blob;
            put_len(buf, blob.vertices().len());
            for v in blob.vertices() {
                put_vec3(buf, v);
            }
            put_len(buf, blob.faces().len());
            for face in blob.faces() {
                let indices = blob.face_vertices(face);
                put_len(buf, indices.len());
                for &i in indices {
                    buf.put_u32_le(i);
                }
            }
            put_vec3(buf, &c.scale);
        }
        Collider::TriangleMesh(m) => {
            put_len(buf, m.blob.vertices().len());
            for v in m.blob.vertices() {
                put_vec3(buf, v);
            }
            put_len(buf, m.blob.triangles().len());
            for tri in m.blob.triangles() {
                for &i in tri {
                    buf.put_u32_le(i);
                }
            }
            put_vec3(buf, &m.scale);
        }
        Collider::Terrain(t) => {
            buf.put_u32_le(t.blob.quads_x());
            buf.put_u32_le(t.blob.quads_z());
            put_len(buf, t.blob.heights().len());
            for &h in t.blob.heights() {
                buf.put_i16_le(h);
            }
            put_vec3(buf, &t.scale);
            buf.put_i32_le(t.base_height_offset);
        }
        Collider::Compound(c) => {
            put_len(buf, c.blob.children().len());
            for child in c.blob.children() {
                put_collider(buf, &child.collider);
                put_rigid(buf, &child.transform);
            }
            buf.put_f32_le(c.scale);
            put_vec3(buf, &c.stretch);
            buf.put_u8(match c.stretch_mode {
                CompoundStretchMode::RotateStretchLocally => 0,
                CompoundStretchMode::IgnoreStretch => 1,
                CompoundStretchMode::StretchPositionsOnly => 2,
            });
        }
    }
}

/// Bounds-checked little-endian reader; `Buf` getters panic on short input.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn need(&self, n: usize) -> Result<(), DumpError> {
        if self.buf.remaining() < n {
            return Err(DumpError::Truncated);
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DumpError> {
        self.need(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, DumpError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self) -> Result<u16, DumpError> {
        self.need(2)?;
        Ok(self.buf.get_u16_le())
    }

    fn u32(&mut self) -> Result<u32, DumpError> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    fn i16(&mut self) -> Result<i16, DumpError> {
        self.need(2)?;
        Ok(self.buf.get_i16_le())
    }

    fn i32(&mut self) -> Result<i32, DumpError> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn f32(&mut self) -> Result<f32, DumpError> {
        self.need(4)?;
        Ok(self.buf.get_f32_le())
    }

    /// Element count, checked against the bytes left so a corrupt length
    /// cannot trigger a huge allocation.
    fn count(&mut self, element_size: usize) -> Result<usize, DumpError> {
        let len = self.u32()? as usize;
        self.need(len.saturating_mul(element_size))?;
        Ok(len)
    }

    fn vec3(&mut self) -> Result<Vec3, DumpError> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    fn quat(&mut self) -> Result<Quat, DumpError> {
        Ok(Quat::new(self.f32()?, self.f32()?, self.f32()?, self.f32()?))
    }

    fn rigid(&mut self) -> Result<RigidTransform, DumpError> {
        let rotation = self.quat()?;
        Ok(RigidTransform::new(rotation, self.vec3()?))
    }

    fn qvvs(&mut self) -> Result<TransformQvvs, DumpError> {
        let position = self.vec3()?;
        let rotation = self.quat()?;
        let scale = self.f32()?;
        Ok(TransformQvvs::new(position, rotation, scale, self.vec3()?))
    }

    fn vertices(&mut self) -> Result<Vec<Vec3>, DumpError> {
        let n = self.count(12)?;
        (0..n).map(|_| self.vec3()).collect()
    }

    fn mode(&mut self, what: &'static str, count: u8) -> Result<u8, DumpError> {
        let tag = self.u8()?;
        if tag >= count {
            return Err(DumpError::UnknownTag { what, tag });
        }
        Ok(tag)
    }

    fn collider(&mut self) -> Result<Collider, CollideError> {
        let tag = self.u8()?;
        let kind = ColliderKind::from_u8(tag).ok_or(DumpError::UnknownTag { what: "collider", tag })?;
        let collider = match kind {
            ColliderKind::Sphere => {
                let center = self.vec3()?;
                let radius = self.f32()?;
                let mode = match self.mode("sphere stretch mode", 2)? {
                    0 => SphereStretchMode::StretchCenter,
                    _ => SphereStretchMode::IgnoreStretch,
                };
                SphereCollider::new(center, radius).with_stretch_mode(mode).into()
            }
            ColliderKind::Capsule => {
                let a = self.vec3()?;
                let b = self.vec3()?;
                let radius = self.f32()?;
                let mode = match self.mode("capsule stretch mode", 2)? {
                    0 => CapsuleStretchMode::StretchPoints,
                    _ => CapsuleStretchMode::IgnoreStretch,
                };
                CapsuleCollider::new(a, b, radius).with_stretch_mode(mode).into()
            }
            ColliderKind::Box => {
                let center = self.vec3()?;
                BoxCollider::new(center, self.vec3()?).into()
            }
            ColliderKind::Triangle => {
                let a = self.vec3()?;
                let b = self.vec3()?;
                TriangleCollider::new(a, b, self.vec3()?).into()
            }
            ColliderKind::Convex => {
                let vertices = self.vertices()?;
                let face_count = self.count(4)?;
                let mut faces = Vec::with_capacity(face_count);
                for _ in 0..face_count {
                    let n = self.count(4)?;
                    faces.push((0..n).map(|_| self.u32()).collect::<Result<Vec<u32>, _>>()?);
                }
                let blob = ConvexBlob::new(vertices, &faces)?;
                ConvexCollider {
                    blob: Arc::new(blob),
                    scale: self.vec3()?,
                }
                .into()
            }
            ColliderKind::TriangleMesh => {
                let vertices = self.vertices()?;
                let n = self.count(12)?;
                let triangles = (0..n)
                    .map(|_| -> Result<[u32; 3], DumpError> { Ok([self.u32()?, self.u32()?, self.u32()?]) })
                    .collect::<Result<Vec<_>, _>>()?;
                let blob = TriMeshBlob::new(vertices, triangles)?;
                TriMeshCollider {
                    blob: Arc::new(blob),
                    scale: self.vec3()?,
                }
                .into()
            }
            ColliderKind::Terrain => {
                let quads_x = self.u32()?;
                let quads_z = self.u32()?;
                let n = self.count(2)?;
                let heights = (0..n).map(|_| self.i16()).collect::<Result<Vec<i16>, _>>()?;
                let blob = TerrainBlob::new(quads_x, quads_z, heights)?;
                TerrainCollider {
                    blob: Arc::new(blob),
                    scale: self.vec3()?,
                    base_height_offset: self.i32()?,
                }
                .into()
            }
            ColliderKind::Compound => {
                let n = self.count(1)?;
                let mut children = Vec::with_capacity(n);
                for _ in 0..n {
                    let child = self.collider()?;
                    children.push((child, self.rigid()?));
                }
                let blob = CompoundBlob::new(children)?;
                let scale = self.f32()?;
                let stretch = self.vec3()?;
                let stretch_mode = match self.mode("compound stretch mode", 3)? {
                    0 => CompoundStretchMode::RotateStretchLocally,
                    1 => CompoundStretchMode::IgnoreStretch,
                    _ => CompoundStretchMode::StretchPositionsOnly,
                };
                CompoundCollider {
                    blob: Arc::new(blob),
                    scale,
                    stretch,
                    stretch_mode,
                }
                .into()
            }
        };
        Ok(collider)
    }
}
