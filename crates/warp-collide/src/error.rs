// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;
use warp_geom::{ColliderKind, GeomError};

/// Errors returned by index construction, queries, and dumps.
///
/// Geometric misses are never errors; they are `None`.
#[derive(Debug, Error)]
pub enum CollideError {
    /// World index `0` is reserved.
    #[error("world index 0 is reserved")]
    InvalidWorldIndex,

    /// Grid settings or build input violate a precondition.
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),

    /// The caster kind cannot be swept.
    #[error("{caster:?} colliders cannot be cast")]
    UnsupportedCast {
        /// Kind of the rejected caster.
        caster: ColliderKind,
    },

    /// Shape construction or strict scaling failed.
    #[error(transparent)]
    Geom(#[from] GeomError),

    /// A writer asked for a worker slot the buffer was not sized for.
    #[error("worker index {index} out of range ({workers} workers)")]
    WorkerIndexOutOfRange {
        /// Requested worker slot.
        index: usize,
        /// Worker slots available.
        workers: usize,
    },

    /// Another writer currently holds this worker slot.
    #[error("worker slot {0} is already being written")]
    WorkerSlotBusy(usize),

    /// A debug dump could not be decoded.
    #[error(transparent)]
    Dump(#[from] DumpError),
}

/// Errors decoding a hex query dump.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DumpError {
    /// Input is not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Record does not start with the dump magic.
    #[error("not a query dump")]
    BadMagic,

    /// Record was written by an unknown format version.
    #[error("unsupported dump version {0}")]
    UnsupportedVersion(u16),

    /// Record ended mid-field.
    #[error("dump truncated")]
    Truncated,

    /// An enum tag has no known meaning.
    #[error("unknown {what} tag {tag}")]
    UnknownTag {
        /// Which enum the tag belongs to.
        what: &'static str,
        /// The tag value.
        tag: u8,
    },

    /// Bytes remain after the record.
    #[error("{0} trailing bytes after dump")]
    TrailingBytes(usize),
}
