//! Runtime diagnostics.
//!
//! Aggregates the counters the shell used to expose on the old board
//! revisions: buffer usage statistics, mailbox drops and supervisor
//! state. Collected by the main loop on demand and logged as one JSON
//! object so a technician can grab it off the serial console. Engine
//! internals (fuzzy error matrix, degraded cycles) are reported by the
//! regulator itself when a run stops.

use serde::Serialize;

use crate::buffer::BoundedBuffer;

/// Point-in-time view of one bounded buffer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BufferReport {
    pub capacity: usize,
    pub free: usize,
    pub filled: usize,
    pub held: usize,
    pub underflow: u32,
    pub overflow: u32,
    pub post_overflow: u32,
}

impl BufferReport {
    pub fn of<T: Default, const N: usize>(buffer: &BoundedBuffer<T, N>) -> Self {
        let stats = buffer.stats();
        Self {
            capacity: buffer.capacity(),
            free: buffer.free_len(),
            filled: buffer.filled_len(),
            held: buffer.held(),
            underflow: stats.underflow,
            overflow: stats.overflow,
            post_overflow: stats.post_overflow,
        }
    }
}

/// Full diagnostics snapshot, built by the main loop on demand.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub temp_fifo: BufferReport,
    pub log_chan: BufferReport,
    pub file_chan: BufferReport,
    pub print_chan: BufferReport,

    pub regulator_dropped_msgs: u32,
    pub sterilizer_dropped_msgs: u32,
    pub fault_dropped_msgs: u32,

    pub latched_faults: u16,
    pub fuzzy_faults: u32,
}

impl DiagnosticsReport {
    /// Single-line JSON for the serial console.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
