//! Bounded two-queue inter-task buffer.
//!
//! The data-plane backbone between the acquisition, regulator, sterilizer
//! and writer tasks. Every buffer owns `N` items split across two queues:
//!
//! ```text
//! producer ── acquire_empty ──▶ (fill) ── submit_filled ──▶ filled queue
//!    ▲                                                         │
//!    │                                                         ▼
//! free queue ◀── release_empty ── (consume) ◀── take_filled ── consumer
//! ```
//!
//! Items move by value; an item is always in exactly one queue or held by
//! exactly one task, so `free + filled + held == N` after every operation.
//! All four operations are O(1) queue splices under a single mutex — no
//! I/O and no sleeping while the lock is held. Exhaustion is counted, not
//! fatal: callers decide whether to retry with a bounded sleep or drop.

use std::sync::{Mutex, MutexGuard};

use heapless::Deque;

use crate::config::{LINE_CAP, LINE_CHANNEL_SIZE};

/// One formatted output line travelling toward storage or the printer.
pub type ReportLine = heapless::String<LINE_CAP>;

/// Line channel between a control task and a writer task.
pub type LineChannel = BoundedBuffer<ReportLine, LINE_CHANNEL_SIZE>;

/// Usage statistics, readable at any time for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BufferStats {
    /// Producer wanted an empty item while the free queue was empty.
    pub underflow: u32,
    /// Release attempted into an already-full free queue (pairing bug).
    pub overflow: u32,
    /// Submit attempted while the filled queue held all N items (pairing bug).
    pub post_overflow: u32,
}

struct Queues<T, const N: usize> {
    free: Deque<T, N>,
    filled: Deque<T, N>,
    /// Items currently checked out by callers.
    held: usize,
    stats: BufferStats,
}

/// Fixed-capacity two-queue buffer. Capacity is set at creation and the
/// backing storage never moves or resizes.
pub struct BoundedBuffer<T, const N: usize> {
    inner: Mutex<Queues<T, N>>,
}

impl<T: Default, const N: usize> Default for BoundedBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default, const N: usize> BoundedBuffer<T, N> {
    /// Create a buffer with all `N` items on the free queue, zeroed.
    pub fn new() -> Self {
        let mut free = Deque::new();
        for _ in 0..N {
            // Cannot fail: the deque capacity equals the item count.
            let _ = free.push_back(T::default());
        }
        Self {
            inner: Mutex::new(Queues {
                free,
                filled: Deque::new(),
                held: 0,
                stats: BufferStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queues<T, N>> {
        // A poisoned lock only means another task panicked mid-splice;
        // the queues themselves are always structurally valid.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Take a zeroed item from the free queue for filling.
    ///
    /// Returns `None` and counts an underflow when no empty item is
    /// available; retry policy belongs to the caller.
    pub fn acquire_empty(&self) -> Option<T> {
        let mut q = self.lock();
        match q.free.pop_front() {
            Some(item) => {
                q.held += 1;
                Some(item)
            }
            None => {
                q.stats.underflow += 1;
                None
            }
        }
    }

    /// Hand a filled item to the consumer side.
    ///
    /// Rejection (`Err(item)`) means the filled queue already holds all
    /// `N` items, which cannot happen when acquire/submit are paired
    /// correctly — it is a consistency guard, counted as `post_overflow`.
    pub fn submit_filled(&self, item: T) -> core::result::Result<(), T> {
        let mut q = self.lock();
        if q.filled.len() == N {
            q.stats.post_overflow += 1;
            return Err(item);
        }
        // Push cannot fail below capacity N.
        match q.filled.push_back(item) {
            Ok(()) => {
                q.held = q.held.saturating_sub(1);
                Ok(())
            }
            Err(item) => {
                q.stats.post_overflow += 1;
                Err(item)
            }
        }
    }

    /// Take the oldest filled item, or `None` when nothing is pending.
    pub fn take_filled(&self) -> Option<T> {
        let mut q = self.lock();
        let item = q.filled.pop_front()?;
        q.held += 1;
        Some(item)
    }

    /// Return a consumed item to the free queue, clearing its payload.
    ///
    /// Rejection means the free queue is already full (pairing bug),
    /// counted as `overflow`.
    pub fn release_empty(&self, item: T) -> core::result::Result<(), T> {
        let mut q = self.lock();
        if q.free.len() == N {
            q.stats.overflow += 1;
            return Err(item);
        }
        // Stale payload must not leak to the next producer.
        drop(item);
        match q.free.push_back(T::default()) {
            Ok(()) => {
                q.held = q.held.saturating_sub(1);
                Ok(())
            }
            Err(_) => {
                q.stats.overflow += 1;
                // The caller's item was already dropped; capacity is
                // restored on the free side regardless.
                Ok(())
            }
        }
    }

    /// Fixed capacity `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of empty items available to producers.
    pub fn free_len(&self) -> usize {
        self.lock().free.len()
    }

    /// Number of filled items awaiting consumption.
    pub fn filled_len(&self) -> usize {
        self.lock().filled.len()
    }

    /// Number of items currently checked out by callers.
    pub fn held(&self) -> usize {
        self.lock().held
    }

    /// True when producers would underflow (no empty item available).
    pub fn is_exhausted(&self) -> bool {
        self.lock().free.is_empty()
    }

    /// Snapshot of the usage statistics.
    pub fn stats(&self) -> BufferStats {
        self.lock().stats
    }
}
