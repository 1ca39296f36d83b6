//! Fixed-capacity byte ring shared by the ingest and playback contexts
//!
//! Exactly one producer (the datagram handler) and one consumer (the
//! playback loop) touch a `RingBuffer`. Cursors and occupancy live behind a
//! single short-held lock, so every operation is all-or-nothing: a datagram
//! is accepted whole or not at all, and a chunk is handed out whole or not
//! at all. Nothing here ever waits for space or data.

use parking_lot::Mutex;
use std::sync::Arc;

/// Which allocation the buffer ended up with at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    Preferred,
    Fallback,
}

/// Consistent view of the buffer taken under one lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    pub occupied: usize,
    pub capacity: usize,
    /// Bytes accepted by `try_write` since creation
    pub total_written: u64,
    /// Bytes handed out by `try_read` since creation
    pub total_read: u64,
}

struct RingState {
    storage: Box<[u8]>,
    write: usize,
    read: usize,
    /// Kept explicitly: equal cursors mean either empty or full.
    occupied: usize,
    total_written: u64,
    total_read: u64,
}

/// Bounded circular byte store
pub struct RingBuffer {
    state: Mutex<RingState>,
    capacity: usize,
    allocation: Allocation,
}

impl RingBuffer {
    /// Create a ring buffer of exactly `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be non-zero");
        Self::from_storage(vec![0u8; capacity].into_boxed_slice(), Allocation::Preferred)
    }

    /// Try to allocate `preferred` bytes, settling for `fallback` if that fails
    pub fn allocate(preferred: usize, fallback: usize) -> Self {
        match try_allocate(preferred) {
            Some(storage) => {
                tracing::info!("Ring buffer allocated: {} bytes", preferred);
                Self::from_storage(storage, Allocation::Preferred)
            }
            None => {
                assert!(fallback > 0, "Fallback capacity must be non-zero");
                tracing::warn!(
                    "Could not allocate {} bytes, using fallback ring buffer of {} bytes",
                    preferred,
                    fallback
                );
                Self::from_storage(vec![0u8; fallback].into_boxed_slice(), Allocation::Fallback)
            }
        }
    }

    fn from_storage(storage: Box<[u8]>, allocation: Allocation) -> Self {
        let capacity = storage.len();
        Self {
            state: Mutex::new(RingState {
                storage,
                write: 0,
                read: 0,
                occupied: 0,
                total_written: 0,
                total_read: 0,
            }),
            capacity,
            allocation,
        }
    }

    /// Copy the whole payload in, or leave the buffer untouched
    ///
    /// Returns false when fewer than `payload.len()` bytes are free.
    pub fn try_write(&self, payload: &[u8]) -> bool {
        let len = payload.len();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if self.capacity - state.occupied < len {
            return false;
        }

        let start = state.write;
        let first = len.min(self.capacity - start);
        state.storage[start..start + first].copy_from_slice(&payload[..first]);
        state.storage[..len - first].copy_from_slice(&payload[first..]);

        state.write = (start + len) % self.capacity;
        state.occupied += len;
        state.total_written += len as u64;
        true
    }

    /// Fill `chunk` entirely from the buffer, or copy nothing
    ///
    /// Returns the number of bytes copied: `chunk.len()` or 0.
    pub fn try_read(&self, chunk: &mut [u8]) -> usize {
        let len = chunk.len();
        if len == 0 {
            return 0;
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.occupied < len {
            return 0;
        }

        let start = state.read;
        let first = len.min(self.capacity - start);
        chunk[..first].copy_from_slice(&state.storage[start..start + first]);
        chunk[first..].copy_from_slice(&state.storage[..len - first]);

        state.read = (start + len) % self.capacity;
        state.occupied -= len;
        state.total_read += len as u64;
        len
    }

    /// Bytes that can be written right now
    pub fn free_space(&self) -> usize {
        self.capacity - self.state.lock().occupied
    }

    /// Bytes currently buffered
    pub fn occupied_space(&self) -> usize {
        self.state.lock().occupied
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    pub fn is_empty(&self) -> bool {
        self.occupied_space() == 0
    }

    /// Get fill level as a ratio in `0.0..=1.0`
    pub fn fill_level(&self) -> f32 {
        self.occupied_space() as f32 / self.capacity as f32
    }

    pub fn stats(&self) -> RingStats {
        let state = self.state.lock();
        RingStats {
            occupied: state.occupied,
            capacity: self.capacity,
            total_written: state.total_written,
            total_read: state.total_read,
        }
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("RingBuffer")
            .field("capacity", &stats.capacity)
            .field("occupied", &stats.occupied)
            .field("allocation", &self.allocation)
            .finish()
    }
}

fn try_allocate(size: usize) -> Option<Box<[u8]>> {
    if size == 0 {
        return None;
    }
    let mut storage = Vec::new();
    storage.try_reserve_exact(size).ok()?;
    storage.resize(size, 0);
    Some(storage.into_boxed_slice())
}

/// Thread-safe handle to a ring buffer
pub type SharedRingBuffer = Arc<RingBuffer>;

/// Allocate the process-wide ring buffer
pub fn create_shared_buffer(preferred: usize, fallback: usize) -> SharedRingBuffer {
    Arc::new(RingBuffer::allocate(preferred, fallback))
}
