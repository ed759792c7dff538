//! Port traits — the boundary between the control core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ control core (regulator / sterilizer)
//! ```
//!
//! Driven adapters (heater PWM, SD card, printer, display, clock)
//! implement these traits. The cores consume them via generics, so the
//! control logic never touches hardware directly and the whole thing
//! runs under test with recording mocks.

use crate::app::events::DisplayEvent;
use crate::error::{FaultCode, StorageError};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Calendar date, for report headers and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateStamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Time source for the control cores.
///
/// Wall-clock values follow the sample timestamp convention: milliseconds
/// since local midnight, wrapping at the day boundary. Monotonic time
/// never wraps and is used only for cadence arithmetic.
pub trait Clock {
    fn date(&self) -> DateStamp;
    fn millis_since_midnight(&self) -> u32;
    fn monotonic_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Heater port (core → PWM hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the heating channels.
pub trait HeaterPort {
    /// Arm the PWM outputs. Duties remain whatever was last set.
    fn enable(&mut self);

    /// Disarm all channels immediately and drop their duties to zero.
    fn disable(&mut self);

    /// Apply a duty percentage (0–100) to one channel.
    fn set_duty(&mut self, channel: usize, percent: u8);
}

// ───────────────────────────────────────────────────────────────
// Storage port (core → SD card / VFS)
// ───────────────────────────────────────────────────────────────

/// File sink for reports and regulator logs.
///
/// `open` is synchronous so the caller can branch on failure; `write`
/// is called by the writer task draining a
/// [`LineChannel`](crate::buffer::LineChannel); `request_close` is
/// deferred — the writer closes the file once the channel has drained.
pub trait StoragePort {
    fn open(&mut self, path: &str) -> Result<(), StorageError>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError>;
    fn request_close(&mut self);
    fn is_open(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Display sink (core → panel, fire-and-forget)
// ───────────────────────────────────────────────────────────────

/// Push-style display notifications. Implementations must never block
/// the control loop; a slow panel drops frames, not control cycles.
pub trait DisplaySink {
    fn emit(&mut self, event: &DisplayEvent);
}

// ───────────────────────────────────────────────────────────────
// Fault sink (core → safety supervisor)
// ───────────────────────────────────────────────────────────────

/// Non-blocking fault reporting. The supervisor on the other side
/// latches control faults and answers with Disable / StopOnError
/// messages through the task mailboxes.
pub trait FaultSink {
    fn post(&mut self, code: FaultCode);
}
