//! Fuzzy heating regulator task core.
//!
//! Owns the per-channel heater state, consumes temperature samples from
//! the acquisition FIFO, runs the fuzzy engine per channel and applies
//! the resulting duty cycles. Control messages arrive through a bounded
//! mailbox polled once per cycle; `Disable` is posted ahead of queued
//! messages and is terminal until the owning task restarts.
//!
//! ```text
//!  Stopped ──Start──▶ Active ──Stop──▶ Stopped
//!     │                  │
//!     └────Disable───────┴────Disable──▶ Disabled (terminal)
//! ```
//!
//! The newest sample is mirrored into a mutex-protected snapshot that
//! the sterilizer and display read by copy; the regulator never blocks
//! on them.

pub mod rate;

use core::fmt::Write as _;
use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::app::events::DisplayEvent;
use crate::app::ports::{Clock, DisplaySink, FaultSink, HeaterPort, StoragePort};
use crate::buffer::{LineChannel, ReportLine};
use crate::config::{CHANNEL_COUNT, MAILBOX_SIZE, SystemConfig, TEMP_QUANTUM};
use crate::error::FaultCode;
use crate::fuzzy::FuzzyEngine;
use crate::mailbox::Mailbox;
use crate::sensors::{TempFifo, TemperatureSample};
use self::rate::SlopeTracker;

// ---------------------------------------------------------------------------
// Messages and state
// ---------------------------------------------------------------------------

/// Control messages accepted by the regulator task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatorMsg {
    Start,
    Stop,
    /// Hard shutdown of heating; posted ahead of queued messages.
    Disable,
}

/// Regulator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatorState {
    Stopped,
    Active,
    /// Terminal until the owning task restarts.
    Disabled,
}

/// The regulator's control mailbox.
pub type RegulatorMailbox = Mailbox<RegulatorMsg, MAILBOX_SIZE>;

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Regulator task context. One instance, owned by the regulator task and
/// driven by [`poll`](Self::poll) once per cycle.
pub struct RegulatorCore {
    config: SystemConfig,
    state: RegulatorState,
    engine: FuzzyEngine,
    duty: [u8; CHANNEL_COUNT],
    trackers: [SlopeTracker; CHANNEL_COUNT],
    /// False until the first Active sample re-baselines the trackers;
    /// prevents a phantom slope from the pre-start zero temperature.
    trackers_armed: bool,
    current: TemperatureSample,

    // Cycle logging
    log_seq: u32,
    log_open: bool,
    log_saturated: u32,

    // Diagnostics
    degraded_cycles: u32,
    reported_fuzzy_errors: u32,

    // Shared plumbing
    mailbox: Arc<RegulatorMailbox>,
    temp_fifo: Arc<TempFifo>,
    log_chan: Arc<LineChannel>,
    snapshot: Arc<Mutex<TemperatureSample>>,
}

impl RegulatorCore {
    pub fn new(
        config: SystemConfig,
        mailbox: Arc<RegulatorMailbox>,
        temp_fifo: Arc<TempFifo>,
        log_chan: Arc<LineChannel>,
    ) -> Self {
        Self {
            config,
            state: RegulatorState::Stopped,
            engine: FuzzyEngine::new(),
            duty: [0; CHANNEL_COUNT],
            trackers: [SlopeTracker::default(); CHANNEL_COUNT],
            trackers_armed: false,
            current: TemperatureSample::default(),
            log_seq: 0,
            log_open: false,
            log_saturated: 0,
            degraded_cycles: 0,
            reported_fuzzy_errors: 0,
            mailbox,
            temp_fifo,
            log_chan,
            snapshot: Arc::new(Mutex::new(TemperatureSample::default())),
        }
    }

    /// Handle for readers of the latest-sample snapshot (sterilizer,
    /// display). Readers copy out under the lock, never hold references.
    pub fn snapshot(&self) -> Arc<Mutex<TemperatureSample>> {
        Arc::clone(&self.snapshot)
    }

    pub fn state(&self) -> RegulatorState {
        self.state
    }

    pub fn duty(&self) -> [u8; CHANNEL_COUNT] {
        self.duty
    }

    pub fn engine(&self) -> &FuzzyEngine {
        &self.engine
    }

    pub fn degraded_cycles(&self) -> u32 {
        self.degraded_cycles
    }

    pub fn log_saturated(&self) -> u32 {
        self.log_saturated
    }

    /// One control cycle: zero-wait mailbox fetch, then at most one
    /// sample's worth of fuzzy computation. Bounded work, no waiting.
    pub fn poll(
        &mut self,
        clock: &impl Clock,
        heaters: &mut impl HeaterPort,
        log_storage: &mut impl StoragePort,
        display: &mut impl DisplaySink,
        faults: &mut impl FaultSink,
    ) {
        if let Some(msg) = self.mailbox.try_fetch() {
            match msg {
                RegulatorMsg::Start => self.start_routine(clock, heaters, log_storage, display),
                RegulatorMsg::Stop => self.stop_routine(heaters, log_storage, display),
                RegulatorMsg::Disable => self.disable_routine(heaters, log_storage, display),
            }
        }

        let Some(item) = self.temp_fifo.take_filled() else {
            // No fresh sample this cycle; duty cycles stay as they are.
            return;
        };
        self.current = item;
        if let Err(rejected) = self.temp_fifo.release_empty(item) {
            // Pairing bug, counted by the buffer; nothing else to do.
            drop(rejected);
        }
        match self.snapshot.lock() {
            Ok(mut snap) => *snap = self.current,
            Err(poisoned) => *poisoned.into_inner() = self.current,
        }

        if self.state == RegulatorState::Active {
            self.control_cycle(heaters, display, faults);
        }
        display.emit(&DisplayEvent::CurrentTemp(self.current.temp));
    }

    // ── Transition routines ───────────────────────────────────

    /// Start heating: arm PWM, clear fuzzy diagnostics, re-baseline the
    /// rate trackers and open a fresh cycle log.
    fn start_routine(
        &mut self,
        clock: &impl Clock,
        heaters: &mut impl HeaterPort,
        log_storage: &mut impl StoragePort,
        display: &mut impl DisplaySink,
    ) {
        if self.state != RegulatorState::Stopped {
            return;
        }
        heaters.enable();
        for ch in 0..CHANNEL_COUNT {
            heaters.set_duty(ch, self.duty[ch]);
        }
        // Rate baselines are taken from the first sample seen while
        // Active, not from whatever snapshot predates the start.
        self.trackers_armed = false;
        self.engine.reset_errors();
        self.reported_fuzzy_errors = 0;
        self.log_seq = 0;

        let name = self.log_file_name(clock);
        self.log_open = match log_storage.open(name.as_str()) {
            Ok(()) => true,
            Err(e) => {
                warn!("regulator: cycle log unavailable ({e})");
                false
            }
        };

        self.state = RegulatorState::Active;
        info!("regulator: started, log {}", name.as_str());
        display.emit(&DisplayEvent::RegulatorState(self.state));
    }

    /// Stop heating: disarm PWM, zero the duties, close the cycle log.
    fn stop_routine(
        &mut self,
        heaters: &mut impl HeaterPort,
        log_storage: &mut impl StoragePort,
        display: &mut impl DisplaySink,
    ) {
        if self.state != RegulatorState::Active {
            return;
        }
        self.shut_heaters(heaters, log_storage);
        self.state = RegulatorState::Stopped;
        info!(
            "regulator: stopped — {} fuzzy errors, {} degraded cycles, {} log lines dropped",
            self.engine.error_count(),
            self.degraded_cycles,
            self.log_saturated,
        );
        if self.engine.error_count() > 0 {
            warn!("regulator: fuzzy error matrix {:?}", self.engine.error_matrix());
        }
        display.emit(&DisplayEvent::HeatPower(self.duty));
        display.emit(&DisplayEvent::RegulatorState(self.state));
    }

    /// Unconditional shutdown from any state; terminal.
    fn disable_routine(
        &mut self,
        heaters: &mut impl HeaterPort,
        log_storage: &mut impl StoragePort,
        display: &mut impl DisplaySink,
    ) {
        self.shut_heaters(heaters, log_storage);
        self.state = RegulatorState::Disabled;
        warn!("regulator: disabled");
        display.emit(&DisplayEvent::HeatPower(self.duty));
        display.emit(&DisplayEvent::RegulatorState(self.state));
    }

    fn shut_heaters(&mut self, heaters: &mut impl HeaterPort, log_storage: &mut impl StoragePort) {
        heaters.disable();
        self.duty = [0; CHANNEL_COUNT];
        if self.log_open {
            log_storage.request_close();
            self.log_open = false;
        }
    }

    // ── Per-cycle control work ────────────────────────────────

    fn control_cycle(
        &mut self,
        heaters: &mut impl HeaterPort,
        display: &mut impl DisplaySink,
        faults: &mut impl FaultSink,
    ) {
        let sample = self.current;
        if !self.trackers_armed {
            for ch in 0..CHANNEL_COUNT {
                self.trackers[ch].reset(
                    sample.temp[ch],
                    sample.timestamp_ms,
                    self.config.melting_end_raw,
                );
            }
            self.trackers_armed = true;
        }
        for ch in 0..CHANNEL_COUNT {
            if sample.temp[ch] >= self.config.critical_temp_raw {
                faults.post(FaultCode::CriticalTemp);
            }

            let computed = self.engine.compute(sample.temp[ch], sample.dtemp[ch]);
            self.duty[ch] = self.resolve_duty(ch, computed);
            heaters.set_duty(ch, self.duty[ch]);

            if let Some(alpha) = self.trackers[ch].update(
                sample.temp[ch],
                sample.timestamp_ms,
                self.config.melting_end_raw,
                self.config.min_track_delta_raw,
            ) {
                if alpha.abs() >= self.config.critical_tg_alpha {
                    faults.post(FaultCode::CriticalRate);
                }
            }
        }
        display.emit(&DisplayEvent::HeatPower(self.duty));

        let errors = self.engine.error_count();
        if errors > self.reported_fuzzy_errors {
            faults.post(FaultCode::FuzzyLogic);
            self.reported_fuzzy_errors = errors;
        }

        if self.log_open {
            self.append_log_line(&sample);
        }
    }

    /// Duty-cycle fallback policy: a zero-sum defuzzification carries no
    /// information, so the channel holds its previous duty and the cycle
    /// is counted as degraded.
    fn resolve_duty(&mut self, channel: usize, computed: Option<u8>) -> u8 {
        match computed {
            Some(duty) => duty,
            None => {
                self.degraded_cycles += 1;
                self.duty[channel]
            }
        }
    }

    /// Best-effort cycle log: saturation is counted, never waited out.
    fn append_log_line(&mut self, sample: &TemperatureSample) {
        let Some(mut line) = self.log_chan.acquire_empty() else {
            self.log_saturated += 1;
            return;
        };
        let c = |raw: i16| f32::from(raw) * TEMP_QUANTUM;
        let _ = writeln!(
            line,
            "{} {:.3} {:.3} {:.3} {:.3} {:.3} {:.3}",
            self.log_seq,
            c(sample.temp[0]),
            c(sample.temp[1]),
            c(sample.temp[2]),
            c(sample.dtemp[0]),
            c(sample.dtemp[1]),
            c(sample.dtemp[2]),
        );
        self.log_seq += 1;
        if self.log_chan.submit_filled(line).is_err() {
            self.log_saturated += 1;
        }
    }

    fn log_file_name(&self, clock: &impl Clock) -> ReportLine {
        let date = clock.date();
        let sec = clock.millis_since_midnight() / 1000;
        let mut name = ReportLine::new();
        let _ = write!(
            name,
            "{}/log{}_{:02}_{:02}_{:02}_{:02}_{:02}.dat",
            self.config.log_dir,
            date.year,
            date.month,
            date.day,
            sec / 3600,
            sec % 3600 / 60,
            sec % 3600 % 60,
        );
        name
    }
}
