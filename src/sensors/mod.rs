//! Temperature acquisition.

pub mod temperature;

use crate::buffer::BoundedBuffer;
use crate::config::{CHANNEL_COUNT, TEMP_FIFO_SIZE};

/// One acquisition period's snapshot of all temperature channels.
///
/// Temperatures are raw sensor counts (1/128 degC). The timestamp is
/// milliseconds since local midnight and wraps at the day boundary.
/// Produced once per sampling period, consumed exactly once by the
/// regulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemperatureSample {
    pub timestamp_ms: u32,
    pub temp: [i16; CHANNEL_COUNT],
    pub dtemp: [i16; CHANNEL_COUNT],
    /// All channels at or above the sterile threshold.
    pub sterile: bool,
}

/// Sample FIFO between the acquisition task and the regulator.
pub type TempFifo = BoundedBuffer<TemperatureSample, TEMP_FIFO_SIZE>;
