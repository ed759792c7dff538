//! Three-channel heater bank (solid-state relays on LEDC PWM).
//!
//! ## Safety contract
//!
//! The bank applies non-zero duty to the gates only while enabled; the
//! regulator's Stop/Disable routines call [`HeaterPort::disable`], which
//! zeroes the hardware outputs regardless of stored duties.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real LEDC channels via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::app::ports::HeaterPort;
use crate::config::CHANNEL_COUNT;
use crate::drivers::hw_init::{self, LEDC_MAX_DUTY};

pub struct HeaterBank {
    enabled: bool,
    duty: [u8; CHANNEL_COUNT],
}

impl Default for HeaterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterBank {
    pub fn new() -> Self {
        let bank = Self {
            enabled: false,
            duty: [0; CHANNEL_COUNT],
        };
        // Gates low until the regulator starts a run.
        for ch in 0..CHANNEL_COUNT {
            hw_init::ledc_set(ch, 0);
        }
        bank
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn duty(&self) -> [u8; CHANNEL_COUNT] {
        self.duty
    }

    fn apply(&self, channel: usize) {
        let counts = if self.enabled {
            (u32::from(self.duty[channel]) * u32::from(LEDC_MAX_DUTY) / 100) as u16
        } else {
            0
        };
        hw_init::ledc_set(channel, counts);
    }
}

impl HeaterPort for HeaterBank {
    fn enable(&mut self) {
        self.enabled = true;
        for ch in 0..CHANNEL_COUNT {
            self.apply(ch);
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.duty = [0; CHANNEL_COUNT];
        for ch in 0..CHANNEL_COUNT {
            hw_init::ledc_set(ch, 0);
        }
    }

    fn set_duty(&mut self, channel: usize, percent: u8) {
        if channel >= CHANNEL_COUNT {
            return;
        }
        self.duty[channel] = percent.min(100);
        self.apply(channel);
    }
}
