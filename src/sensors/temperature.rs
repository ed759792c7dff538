//! ADT7410 temperature acquisition (3 sensors on one I2C bus).
//!
//! Thin acquisition front-end: reads the raw 16-bit conversion from each
//! sensor, derives the per-channel delta against the previous period and
//! the all-channels-sterile flag, and publishes the snapshot into the
//! temperature FIFO. Filtering beyond the delta lives in the sensor's
//! own comparator configuration, not here.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the sensors through the hw_init I2C helpers.
//! On host/test: reads from static atomics for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicI16, Ordering};

use crate::app::ports::Clock;
use crate::config::{CHANNEL_COUNT, SystemConfig};
use crate::error::SensorError;
use crate::sensors::{TempFifo, TemperatureSample};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_RAW: [AtomicI16; CHANNEL_COUNT] = [
    AtomicI16::new(0),
    AtomicI16::new(0),
    AtomicI16::new(0),
];

/// Inject a raw channel reading (host/test builds).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw(channel: usize, counts: i16) {
    if channel < CHANNEL_COUNT {
        SIM_RAW[channel].store(counts, Ordering::Relaxed);
    }
}

/// Acquisition front-end state.
pub struct TempReader {
    sterile_temp: i16,
    prev: Option<[i16; CHANNEL_COUNT]>,
}

impl TempReader {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sterile_temp: config.sterile_temp_raw,
            prev: None,
        }
    }

    /// True once at least one full sample has been produced — the
    /// sterilizer's Init state waits on this before accepting Start.
    pub fn initialized(&self) -> bool {
        self.prev.is_some()
    }

    /// Read all channels and build one snapshot.
    ///
    /// The first sample after construction reports zero deltas. A failed
    /// channel aborts the whole sample; the error carries the channel
    /// index so the fault can be attributed.
    pub fn sample(
        &mut self,
        clock: &impl Clock,
    ) -> Result<TemperatureSample, (usize, SensorError)> {
        let mut temp = [0i16; CHANNEL_COUNT];
        for (ch, slot) in temp.iter_mut().enumerate() {
            *slot = self.read_raw(ch).map_err(|e| (ch, e))?;
        }

        let prev = self.prev.unwrap_or(temp);
        let mut dtemp = [0i16; CHANNEL_COUNT];
        for ch in 0..CHANNEL_COUNT {
            dtemp[ch] = temp[ch].wrapping_sub(prev[ch]);
        }
        self.prev = Some(temp);

        let sterile = temp.iter().all(|&t| t >= self.sterile_temp);
        Ok(TemperatureSample {
            timestamp_ms: clock.millis_since_midnight(),
            temp,
            dtemp,
            sterile,
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_raw(&self, channel: usize) -> Result<i16, SensorError> {
        hw_init::i2c_read_temp(channel).map_err(|_| SensorError::BusReadFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&self, channel: usize) -> Result<i16, SensorError> {
        Ok(SIM_RAW[channel].load(Ordering::Relaxed))
    }
}

/// Push a sample into the FIFO with correct acquire/submit pairing.
///
/// Returns `false` (sample dropped, underflow counted by the buffer)
/// when the regulator has fallen behind and the FIFO is full.
pub fn publish(fifo: &TempFifo, sample: TemperatureSample) -> bool {
    match fifo.acquire_empty() {
        Some(mut item) => {
            item.timestamp_ms = sample.timestamp_ms;
            item.temp = sample.temp;
            item.dtemp = sample.dtemp;
            item.sterile = sample.sterile;
            fifo.submit_filled(item).is_ok()
        }
        None => false,
    }
}
