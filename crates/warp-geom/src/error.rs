// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;

use crate::shapes::ColliderKind;

/// Errors produced by shape construction and scaling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeomError {
    /// A shape that only supports uniform scale was given a non-uniform stretch.
    #[error("{kind:?} colliders only support uniform scale")]
    NonUniformScale {
        /// Kind of collider that rejected the stretch.
        kind: ColliderKind,
    },

    /// Blob construction input was malformed.
    #[error("invalid blob: {0}")]
    InvalidBlob(&'static str),

    /// An index referenced data outside a blob or array.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Length of the indexed collection.
        len: usize,
    },
}
