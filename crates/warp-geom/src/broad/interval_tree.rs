// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Implicit interval tree over one axis.
//!
//! Intervals are supplied sorted by their minimum and laid out in Eytzinger
//! (breadth-first) order: node `i` has children `2i + 1` and `2i + 2`, and an
//! in-order walk visits intervals in ascending `min` order. Each node also
//! caches the largest `max` in its subtree, which lets a query discard whole
//! subtrees that end before the query range starts.
//!
//! Queries cost `O(log n + k)` and never allocate.

/// One interval stored in the tree.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct IntervalNode {
    /// Interval start.
    pub min: f32,
    /// Interval end.
    pub max: f32,
    /// Largest `max` in the subtree rooted here.
    pub subtree_max: f32,
    /// Position of this interval in the sorted input.
    pub index: u32,
}

/// Depth bound for the traversal stack; `u32` indices cap trees at 33 levels.
const MAX_DEPTH: usize = 64;

/// Lays `sorted` out as an interval tree in `out`.
///
/// `sorted` must be ordered by ascending `min` and `out.len()` must equal
/// `sorted.len()`. Each node's `index` is the interval's position in `sorted`.
pub fn build_nodes(sorted: &[(f32, f32)], out: &mut [IntervalNode]) {
    debug_assert_eq!(sorted.len(), out.len());
    debug_assert!(sorted.windows(2).all(|w| !(w[0].0 > w[1].0)));
    let mut cursor = 0usize;
    fill_in_order(sorted, out, 0, &mut cursor);
    debug_assert_eq!(cursor, sorted.len());
    for i in (0..out.len()).rev() {
        let mut subtree_max = out[i].max;
        for child in [2 * i + 1, 2 * i + 2] {
            if let Some(c) = out.get(child) {
                subtree_max = subtree_max.max(c.subtree_max);
            }
        }
        out[i].subtree_max = subtree_max;
    }
}

fn fill_in_order(sorted: &[(f32, f32)], out: &mut [IntervalNode], node: usize, cursor: &mut usize) {
    if node >= out.len() {
        return;
    }
    fill_in_order(sorted, out, 2 * node + 1, cursor);
    let (min, max) = sorted[*cursor];
    out[node] = IntervalNode {
        min,
        max,
        subtree_max: max,
        index: u32::try_from(*cursor).unwrap_or(u32::MAX),
    };
    *cursor += 1;
    fill_in_order(sorted, out, 2 * node + 2, cursor);
}

/// Borrowed view over nodes produced by [`build_nodes`].
#[derive(Debug, Copy, Clone)]
pub struct IntervalTree<'a> {
    nodes: &'a [IntervalNode],
}

impl<'a> IntervalTree<'a> {
    /// Wraps a node slice laid out by [`build_nodes`].
    pub fn new(nodes: &'a [IntervalNode]) -> Self {
        Self { nodes }
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the tree holds no intervals.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Raw node storage.
    pub fn nodes(&self) -> &'a [IntervalNode] {
        self.nodes
    }

    /// Lazily yields the sorted-input positions of every interval overlapping
    /// `[min, max]` (inclusive), in ascending interval-start order.
    pub fn overlaps(&self, min: f32, max: f32) -> Overlaps<'a> {
        Overlaps {
            nodes: self.nodes,
            query_min: min,
            query_max: max,
            stack: [0; MAX_DEPTH],
            depth: 0,
            descend: Some(0),
        }
    }
}

/// Iterator returned by [`IntervalTree::overlaps`].
#[derive(Debug, Clone)]
pub struct Overlaps<'a> {
    nodes: &'a [IntervalNode],
    query_min: f32,
    query_max: f32,
    stack: [u32; MAX_DEPTH],
    depth: usize,
    descend: Option<usize>,
}

impl Iterator for Overlaps<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            while let Some(i) = self.descend {
                match self.nodes.get(i) {
                    Some(node) if node.subtree_max >= self.query_min => {
                        debug_assert!(self.depth < MAX_DEPTH);
                        self.stack[self.depth] = u32::try_from(i).unwrap_or(u32::MAX);
                        self.depth += 1;
                        self.descend = Some(2 * i + 1);
                    }
                    _ => self.descend = None,
                }
            }
            if self.depth == 0 {
                return None;
            }
            self.depth -= 1;
            let i = self.stack[self.depth] as usize;
            let node = self.nodes[i];
            if node.min > self.query_max {
                // Every pending ancestor starts at or after this node.
                self.depth = 0;
                return None;
            }
            self.descend = Some(2 * i + 2);
            if node.max >= self.query_min {
                return Some(node.index);
            }
        }
    }
}
