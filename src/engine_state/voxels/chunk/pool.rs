//! # Chunk Pool
//!
//! Thread-safe free list of disposed chunks. A chunk is a few hundred
//! kilobytes of arrays, so builds reuse retired chunks instead of allocating.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use log::debug;

use super::Chunk;

/// A bounded, thread-safe pool of reset chunks.
///
/// Taking from an empty pool is never an error: [`take_or_allocate`](Self::take_or_allocate)
/// falls back to a fresh allocation. Recycling into a full pool drops the chunk.
pub struct ChunkPool {
    free: Mutex<Vec<Chunk>>,
    capacity: usize,
    allocated: AtomicUsize,
}

impl ChunkPool {
    /// Creates an empty pool keeping at most `capacity` idle chunks.
    pub fn new(capacity: usize) -> Self {
        ChunkPool {
            free: Mutex::new(Vec::with_capacity(capacity.min(64))),
            capacity,
            allocated: AtomicUsize::new(0),
        }
    }

    /// Allocates chunks into the pool until it holds `count` (bounded by capacity).
    pub fn prewarm(&self, count: usize) {
        let target = count.min(self.capacity);
        let mut free = self.lock_free();
        while free.len() < target {
            free.push(self.allocate());
        }
        debug!("Prewarmed chunk pool with {} chunk(s)", free.len());
    }

    /// Takes an idle chunk, if any.
    pub fn take(&self) -> Option<Chunk> {
        self.lock_free().pop()
    }

    /// Takes an idle chunk or allocates a new one.
    pub fn take_or_allocate(&self) -> Chunk {
        self.take().unwrap_or_else(|| self.allocate())
    }

    /// Disposes a chunk and keeps it for reuse.
    ///
    /// # Returns
    /// `false` if the pool was full and the chunk was dropped.
    pub fn recycle(&self, mut chunk: Chunk) -> bool {
        chunk.dispose();

        let mut free = self.lock_free();
        if free.len() >= self.capacity {
            return false;
        }
        free.push(chunk);
        true
    }

    /// Number of idle chunks.
    pub fn len(&self) -> usize {
        self.lock_free().len()
    }

    /// Whether the pool has no idle chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of idle chunks kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total chunks this pool has ever allocated.
    pub fn allocated_count(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    fn allocate(&self) -> Chunk {
        self.allocated.fetch_add(1, Ordering::AcqRel);
        Chunk::new()
    }

    fn lock_free(&self) -> MutexGuard<'_, Vec<Chunk>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
