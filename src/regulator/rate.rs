//! Heating/cooling rate tracking (`tg_alpha`).
//!
//! Each channel tracks the slope of its temperature curve against a
//! reference point. Two phases are tracked separately: *idle* (below the
//! melting band) and *melting* (at or above it) — crossing the melting
//! threshold re-baselines the reference, because the wax load's thermal
//! behaviour changes once it liquefies. A slope is only reported after
//! the temperature has travelled a minimum delta from the reference, so
//! sensor noise near the baseline never produces a phantom rate.
//!
//! Sample timestamps are milliseconds since local midnight and wrap at
//! the day boundary; elapsed-time arithmetic must survive a reference
//! taken before midnight with the current sample after it.

use crate::config::{DAY_MS, TEMP_QUANTUM};

/// Elapsed milliseconds from `reference` to `now`, both ms-since-midnight.
///
/// When `now` is numerically smaller the interval spans midnight.
pub fn wrap_elapsed_ms(reference: u32, now: u32) -> u32 {
    if now >= reference {
        now - reference
    } else {
        DAY_MS - reference + now
    }
}

/// Thermal phase of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Below the melting band — solid wax, slow thermal response.
    #[default]
    Idle,
    /// At or above the melting band.
    Melting,
}

/// Per-channel slope tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlopeTracker {
    phase: Phase,
    base_temp: i16,
    base_time_ms: u32,
    /// Last computed rate of change (degC per second).
    pub tg_alpha: f32,
}

impl SlopeTracker {
    /// Re-baseline at the given sample (Start routine and phase changes).
    pub fn reset(&mut self, temp: i16, now_ms: u32, melting_end: i16) {
        self.phase = if temp >= melting_end { Phase::Melting } else { Phase::Idle };
        self.base_temp = temp;
        self.base_time_ms = now_ms;
        self.tg_alpha = 0.0;
    }

    /// Feed one sample. Returns `Some(tg_alpha)` when a slope was
    /// computed this cycle, `None` while still inside the minimum-delta
    /// window or right after a phase change.
    pub fn update(
        &mut self,
        temp: i16,
        now_ms: u32,
        melting_end: i16,
        min_delta: i16,
    ) -> Option<f32> {
        let phase = if temp >= melting_end { Phase::Melting } else { Phase::Idle };
        if phase != self.phase {
            self.reset(temp, now_ms, melting_end);
            return None;
        }

        let delta = temp.wrapping_sub(self.base_temp);
        if delta.abs() < min_delta {
            return None;
        }
        let elapsed_ms = wrap_elapsed_ms(self.base_time_ms, now_ms);
        if elapsed_ms == 0 {
            // Reference and sample share a timestamp; no slope yet.
            return None;
        }
        self.tg_alpha = (f32::from(delta) * TEMP_QUANTUM) / (elapsed_ms as f32 / 1000.0);
        Some(self.tg_alpha)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn baseline(&self) -> (i16, u32) {
        (self.base_temp, self.base_time_ms)
    }
}
