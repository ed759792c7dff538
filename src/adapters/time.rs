//! System clock adapter.
//!
//! Monotonic time from `std::time::Instant`; calendar date and
//! time-of-day from the system clock via `chrono` (the RTC is synced
//! into the system clock at boot on the target).

use std::time::Instant;

use chrono::{Datelike, Timelike};

use crate::app::ports::{Clock, DateStamp};

pub struct SystemClock {
    boot: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}

impl Clock for SystemClock {
    fn date(&self) -> DateStamp {
        let now = chrono::Local::now();
        DateStamp {
            year: now.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: now.month() as u8,
            day: now.day() as u8,
        }
    }

    fn millis_since_midnight(&self) -> u32 {
        let t = chrono::Local::now().time();
        t.num_seconds_from_midnight() * 1000 + t.nanosecond() / 1_000_000
    }

    fn monotonic_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_never_decreases() {
        let clock = SystemClock::new();
        let a = clock.monotonic_ms();
        let b = clock.monotonic_ms();
        assert!(b >= a);
    }

    #[test]
    fn wall_clock_values_are_in_range() {
        let clock = SystemClock::new();
        let date = clock.date();
        assert!((1..=12).contains(&date.month));
        assert!((1..=31).contains(&date.day));
        assert!(clock.millis_since_midnight() < crate::config::DAY_MS);
    }
}
