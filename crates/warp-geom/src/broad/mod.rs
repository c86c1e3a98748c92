// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Broad-phase acceleration structures shared by collision layers and mesh blobs.
//!
//! Determinism contract:
//! - Structures are built from inputs whose order is already canonical; the
//!   layout is a pure function of that order.
//! - Overlap is inclusive on interval endpoints.

#[doc = "One-axis implicit interval tree."]
pub mod interval_tree;
