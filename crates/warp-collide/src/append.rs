// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-worker append-only record store.
//!
//! Each worker slot owns a chain of fixed-capacity blocks. A writer borrows
//! exactly one slot; slots are never shared, so the slot lock is always
//! uncontended and a writer never waits on another worker. Enumeration and
//! counting take `&mut self`, which statically proves every writer is gone.
//!
//! Enumeration order is worker-major, then write order. That order depends on
//! scheduling; callers rank-sort by a key when they need a canonical order.

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use crate::error::CollideError;
use crate::exec::WorkerIndex;

/// Records per block.
pub const BLOCK_CAPACITY: usize = 256;

#[derive(Debug)]
struct WorkerChain<T> {
    blocks: Vec<Vec<T>>,
    len: usize,
}

impl<T> Default for WorkerChain<T> {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            len: 0,
        }
    }
}

impl<T> WorkerChain<T> {
    fn push(&mut self, record: T) {
        match self.blocks.last_mut() {
            Some(block) if block.len() < BLOCK_CAPACITY => block.push(record),
            _ => {
                let mut block = Vec::with_capacity(BLOCK_CAPACITY);
                block.push(record);
                self.blocks.push(block);
            }
        }
        self.len += 1;
    }
}

/// Append-only store with one block chain per worker.
#[derive(Debug)]
pub struct ParallelAppendBuffer<T> {
    slots: Box<[Mutex<WorkerChain<T>>]>,
}

/// Exclusive writer for one worker slot.
#[derive(Debug)]
pub struct AppendWriter<'a, T> {
    chain: MutexGuard<'a, WorkerChain<T>>,
}

impl<T> AppendWriter<'_, T> {
    /// Appends `record`; amortised O(1).
    pub fn write(&mut self, record: T) {
        self.chain.push(record);
    }

    /// Records written to this slot so far.
    pub fn len(&self) -> usize {
        self.chain.len
    }

    /// `true` when this slot holds no records.
    pub fn is_empty(&self) -> bool {
        self.chain.len == 0
    }
}

impl<T: Send> ParallelAppendBuffer<T> {
    /// Buffer with `worker_count` slots. The slot table never grows.
    pub fn new(worker_count: usize) -> Self {
        Self {
            slots: (0..worker_count.max(1))
                .map(|_| Mutex::new(WorkerChain::default()))
                .collect(),
        }
    }

    /// Number of worker slots.
    pub fn worker_count(&self) -> usize {
        self.slots.len()
    }

    /// Borrows the slot for `worker`.
    ///
    /// # Errors
    /// [`CollideError::WorkerIndexOutOfRange`] for an unknown slot;
    /// [`CollideError::WorkerSlotBusy`] when another writer holds it.
    pub fn writer(&self, worker: WorkerIndex) -> Result<AppendWriter<'_, T>, CollideError> {
        let slot = self
            .slots
            .get(worker.0)
            .ok_or(CollideError::WorkerIndexOutOfRange {
                index: worker.0,
                workers: self.slots.len(),
            })?;
        let chain = match slot.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(CollideError::WorkerSlotBusy(worker.0)),
        };
        Ok(AppendWriter { chain })
    }

    fn chains(&mut self) -> impl Iterator<Item = &mut WorkerChain<T>> {
        self.slots
            .iter_mut()
            .map(|m| m.get_mut().unwrap_or_else(PoisonError::into_inner))
    }

    /// Total records across all workers.
    pub fn len(&mut self) -> usize {
        self.chains().map(|c| c.len).sum()
    }

    /// `true` when no worker has written anything.
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Every block, worker-major. Records inside a block are contiguous.
    pub fn blocks(&mut self) -> impl Iterator<Item = &[T]> {
        self.chains()
            .flat_map(|c| c.blocks.iter().map(Vec::as_slice))
    }

    /// Every record, worker-major then write order.
    pub fn iter(&mut self) -> impl Iterator<Item = &T> {
        self.blocks().flatten()
    }

    /// Moves every record out, worker-major then write order.
    pub fn into_vec(self) -> Vec<T> {
        let mut out = Vec::new();
        for slot in self.slots.into_vec() {
            let chain = slot.into_inner().unwrap_or_else(PoisonError::into_inner);
            out.reserve(chain.len);
            for block in chain.blocks {
                out.extend(block);
            }
        }
        out
    }
}

impl<T: bytemuck::Pod + Send> ParallelAppendBuffer<T> {
    /// Raw bytes of every block, worker-major, for bulk copies.
    pub fn block_bytes(&mut self) -> impl Iterator<Item = &[u8]> {
        self.blocks().map(bytemuck::cast_slice)
    }
}
