//! Bounded FIFO control mailboxes.
//!
//! Each control task (regulator, sterilizer) polls its mailbox with a
//! zero-wait fetch at the top of every cycle, does bounded work, then
//! sleeps for a fixed short interval. Senders never block: a full
//! mailbox rejects the message and the caller decides what to do.
//!
//! `post_ahead` inserts at the front of the queue, giving shutdown
//! messages deterministic precedence over anything already queued.

use std::sync::{Mutex, MutexGuard};

use heapless::Deque;

/// Fixed-capacity control-message mailbox.
pub struct Mailbox<M, const N: usize> {
    queue: Mutex<Deque<M, N>>,
    dropped: Mutex<u32>,
}

impl<M, const N: usize> Default for Mailbox<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, const N: usize> Mailbox<M, N> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Deque::new()),
            dropped: Mutex::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Deque<M, N>> {
        match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a message. `Err(msg)` when the mailbox is full.
    pub fn post(&self, msg: M) -> core::result::Result<(), M> {
        let result = self.lock().push_back(msg);
        if result.is_err() {
            self.count_drop();
        }
        result
    }

    /// Insert a message ahead of everything queued. Used for the
    /// regulator Disable message so it preempts pending Start/Stop.
    pub fn post_ahead(&self, msg: M) -> core::result::Result<(), M> {
        let result = self.lock().push_front(msg);
        if result.is_err() {
            self.count_drop();
        }
        result
    }

    /// Zero-wait fetch of the oldest (or highest-priority) message.
    pub fn try_fetch(&self) -> Option<M> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Messages rejected because the mailbox was full.
    pub fn dropped(&self) -> u32 {
        match self.dropped.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn count_drop(&self) {
        match self.dropped.lock() {
            Ok(mut guard) => *guard += 1,
            Err(poisoned) => *poisoned.into_inner() += 1,
        }
    }
}
