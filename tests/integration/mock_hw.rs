//! Mock adapters for integration tests.
//!
//! Record every port interaction so tests can assert on the full
//! history without touching real PWM/SD/LCD hardware.

use std::cell::Cell;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use waxsteril::app::events::DisplayEvent;
use waxsteril::app::ports::{Clock, DateStamp, DisplaySink, FaultSink, HeaterPort, StoragePort};
use waxsteril::buffer::LineChannel;
use waxsteril::config::CHANNEL_COUNT;
use waxsteril::error::{FaultCode, StorageError};

// ── Heater bank ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterCall {
    Enable,
    Disable,
    SetDuty { channel: usize, percent: u8 },
}

#[derive(Default)]
pub struct MockHeaters {
    pub calls: Vec<HeaterCall>,
    pub enabled: bool,
    pub duty: [u8; CHANNEL_COUNT],
}

impl HeaterPort for MockHeaters {
    fn enable(&mut self) {
        self.enabled = true;
        self.calls.push(HeaterCall::Enable);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.duty = [0; CHANNEL_COUNT];
        self.calls.push(HeaterCall::Disable);
    }

    fn set_duty(&mut self, channel: usize, percent: u8) {
        self.duty[channel] = percent;
        self.calls.push(HeaterCall::SetDuty { channel, percent });
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDisplay {
    pub events: Vec<DisplayEvent>,
}

#[allow(dead_code)]
impl RecordingDisplay {
    pub fn result_lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::ResultLine(line) => Some(line.as_str().to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn cleared_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DisplayEvent::ResultListCleared))
            .count()
    }
}

impl DisplaySink for RecordingDisplay {
    fn emit(&mut self, event: &DisplayEvent) {
        self.events.push(event.clone());
    }
}

// ── Faults ────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingFaults {
    pub codes: Vec<FaultCode>,
}

impl FaultSink for RecordingFaults {
    fn post(&mut self, code: FaultCode) {
        self.codes.push(code);
    }
}

// ── Storage ───────────────────────────────────────────────────

pub struct MockStorage {
    pub opens: Vec<String>,
    pub close_requests: u32,
    pub fail_open: bool,
    open: bool,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self {
            opens: Vec::new(),
            close_requests: 0,
            fail_open: false,
            open: false,
        }
    }
}

impl StoragePort for MockStorage {
    fn open(&mut self, path: &str) -> Result<(), StorageError> {
        if self.fail_open {
            return Err(StorageError::OpenFailed);
        }
        self.opens.push(path.to_string());
        self.open = true;
        Ok(())
    }

    fn write(&mut self, _bytes: &[u8]) -> Result<(), StorageError> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::NotOpen)
        }
    }

    fn request_close(&mut self) {
        self.close_requests += 1;
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Manually advanced clock. `Cell`s keep the `Clock` trait's `&self`
/// signature while tests move time forward.
pub struct FixedClock {
    pub date: DateStamp,
    pub midnight_ms: Cell<u32>,
    pub mono_ms: Cell<u64>,
}

#[allow(dead_code)]
impl FixedClock {
    pub fn new() -> Self {
        Self {
            date: DateStamp { year: 2024, month: 3, day: 9 },
            midnight_ms: Cell::new(43_200_000), // noon
            mono_ms: Cell::new(0),
        }
    }

    /// Advance both the monotonic and wall clocks.
    pub fn advance_ms(&self, ms: u64) {
        self.mono_ms.set(self.mono_ms.get() + ms);
        let wall = (u64::from(self.midnight_ms.get()) + ms)
            % u64::from(waxsteril::config::DAY_MS);
        self.midnight_ms.set(wall as u32);
    }
}

impl Clock for FixedClock {
    fn date(&self) -> DateStamp {
        self.date
    }

    fn millis_since_midnight(&self) -> u32 {
        self.midnight_ms.get()
    }

    fn monotonic_ms(&self) -> u64 {
        self.mono_ms.get()
    }
}

// ── Line-channel collector ────────────────────────────────────

/// Consume a line channel on a background thread until the report
/// footer passes through, returning the exact byte sequence.
pub fn spawn_collector(chan: Arc<LineChannel>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut out = Vec::new();
        loop {
            match chan.take_filled() {
                Some(line) => {
                    out.extend_from_slice(line.as_bytes());
                    let done = line.contains("Result:");
                    let _ = chan.release_empty(line);
                    if done {
                        return out;
                    }
                }
                None => thread::sleep(Duration::from_millis(1)),
            }
        }
    })
}
