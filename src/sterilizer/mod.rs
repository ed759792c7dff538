//! Sterilization-run task core.
//!
//! Owns the run lifecycle and the bounded result list. Once per save
//! interval while a run is active it copies the regulator's latest
//! temperature snapshot and appends a result line; transient non-sterile
//! readings are debounced by a per-run swing budget. A finished run
//! drains the list — header, column captions, body, footer — through the
//! file or printer line channel, one line per buffer item.
//!
//! ```text
//!  Init ──SensorsReady──▶ Stopped ──Start──▶ Active ──(done/fail/Stop)──▶ Saving ──▶ Stopped
//!                            │  ▲                │
//!                            │  └──── Printing ◀─┘ (Print, from Stopped)
//!                            │
//!                         StopOnError (any state) ──▶ Error (latched)
//! ```

pub mod report;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{info, warn};

use crate::app::events::DisplayEvent;
use crate::app::ports::{Clock, DateStamp, DisplaySink, StoragePort};
use crate::buffer::{LineChannel, ReportLine};
use crate::config::{MAILBOX_SIZE, RESULT_LIST_SIZE, SystemConfig};
use crate::mailbox::Mailbox;
use crate::regulator::{RegulatorMailbox, RegulatorMsg};
use crate::sensors::TemperatureSample;

// ---------------------------------------------------------------------------
// Messages and state
// ---------------------------------------------------------------------------

/// Control messages accepted by the sterilizer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SterilizerMsg {
    /// One-time signal: temperature acquisition finished initializing.
    SensorsReady,
    Start,
    Stop,
    /// Fault propagation from the safety supervisor; latches Error.
    StopOnError,
    /// Reprint the stored result list.
    Print,
}

/// Sterilization process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SterilizerState {
    Init,
    Stopped,
    Active,
    Saving,
    Printing,
    /// Latched; requires an external reset.
    Error,
}

/// The sterilizer's control mailbox.
pub type SterilizerMailbox = Mailbox<SterilizerMsg, MAILBOX_SIZE>;

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Sterilizer task context. One instance, owned by the sterilizer task
/// and driven by [`poll`](Self::poll) once per cycle.
pub struct SterilizerCore {
    config: SystemConfig,
    state: SterilizerState,

    results: heapless::Vec<ReportLine, RESULT_LIST_SIZE>,
    result_overflow: u32,

    start_date: DateStamp,
    start_ms: u32,
    end_ms: u32,
    final_result: bool,
    swings: u8,
    next_sample_at: u64,

    mailbox: Arc<SterilizerMailbox>,
    regulator: Arc<RegulatorMailbox>,
    snapshot: Arc<Mutex<TemperatureSample>>,
    file_chan: Arc<LineChannel>,
    print_chan: Arc<LineChannel>,
}

impl SterilizerCore {
    pub fn new(
        config: SystemConfig,
        mailbox: Arc<SterilizerMailbox>,
        regulator: Arc<RegulatorMailbox>,
        snapshot: Arc<Mutex<TemperatureSample>>,
        file_chan: Arc<LineChannel>,
        print_chan: Arc<LineChannel>,
    ) -> Self {
        Self {
            config,
            state: SterilizerState::Init,
            results: heapless::Vec::new(),
            result_overflow: 0,
            start_date: DateStamp { year: 1980, month: 1, day: 1 },
            start_ms: 0,
            end_ms: 0,
            final_result: false,
            swings: 0,
            next_sample_at: 0,
            mailbox,
            regulator,
            snapshot,
            file_chan,
            print_chan,
        }
    }

    pub fn state(&self) -> SterilizerState {
        self.state
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn final_result(&self) -> bool {
        self.final_result
    }

    pub fn swings(&self) -> u8 {
        self.swings
    }

    pub fn result_overflow(&self) -> u32 {
        self.result_overflow
    }

    /// One control cycle: zero-wait mailbox fetch, then state work.
    pub fn poll(
        &mut self,
        clock: &impl Clock,
        storage: &mut impl StoragePort,
        display: &mut impl DisplaySink,
    ) {
        if let Some(msg) = self.mailbox.try_fetch() {
            match msg {
                SterilizerMsg::SensorsReady => {
                    if self.state == SterilizerState::Init {
                        self.enter(SterilizerState::Stopped, display);
                    }
                }
                SterilizerMsg::Start => self.start_routine(clock, display),
                SterilizerMsg::Stop => self.stop_routine(clock, display),
                SterilizerMsg::StopOnError => {
                    warn!("sterilizer: fault stop, latching Error");
                    self.enter(SterilizerState::Error, display);
                }
                SterilizerMsg::Print => {
                    if self.state == SterilizerState::Stopped {
                        self.enter(SterilizerState::Printing, display);
                    }
                }
            }
        }

        match self.state {
            SterilizerState::Active => self.sample_cycle(clock, display),
            SterilizerState::Saving => self.save_routine(clock, storage, display),
            SterilizerState::Printing => self.print_routine(display),
            _ => {}
        }
    }

    // ── Transition routines ───────────────────────────────────

    fn start_routine(&mut self, clock: &impl Clock, display: &mut impl DisplaySink) {
        if self.state != SterilizerState::Stopped {
            return;
        }
        if !self.results.is_empty() {
            self.results.clear();
            display.emit(&DisplayEvent::ResultListCleared);
        }
        self.start_date = clock.date();
        self.start_ms = clock.millis_since_midnight();
        self.final_result = false;
        self.swings = 0;
        display.emit(&DisplayEvent::RunStarted {
            date: self.start_date,
            start_ms: self.start_ms,
        });
        if self.regulator.post(RegulatorMsg::Start).is_err() {
            warn!("sterilizer: regulator mailbox full on Start");
        }
        // First result sample is taken on the next cycle, then once per
        // save interval — 61 slots cover exactly one hour.
        self.next_sample_at = clock.monotonic_ms();
        self.enter(SterilizerState::Active, display);
        info!(
            "sterilizer: run started {:02}:{:02}",
            report::hms(self.start_ms).0,
            report::hms(self.start_ms).1
        );
    }

    fn stop_routine(&mut self, clock: &impl Clock, display: &mut impl DisplaySink) {
        if self.state != SterilizerState::Active {
            return;
        }
        if self.regulator.post(RegulatorMsg::Stop).is_err() {
            warn!("sterilizer: regulator mailbox full on Stop");
        }
        self.end_ms = clock.millis_since_midnight();
        display.emit(&DisplayEvent::RunEnded {
            end_ms: self.end_ms,
            success: self.final_result,
        });
        self.enter(SterilizerState::Saving, display);
        info!(
            "sterilizer: run ended, result {}",
            if self.final_result { "SUCCESS" } else { "FAILURE" }
        );
    }

    // ── Sampling cadence ──────────────────────────────────────

    fn sample_cycle(&mut self, clock: &impl Clock, display: &mut impl DisplaySink) {
        let now = clock.monotonic_ms();
        if now >= self.next_sample_at {
            let sample = match self.snapshot.lock() {
                Ok(snap) => *snap,
                Err(poisoned) => *poisoned.into_inner(),
            };
            let interval = u64::from(self.config.save_interval_s) * 1000;

            if sample.sterile {
                self.append_result(&sample, display);
                self.next_sample_at = now + interval;
            } else if !self.results.is_empty() {
                if self.swings <= self.config.max_temp_swings {
                    // Tolerated swing: charge the budget, restart the list.
                    self.swings += 1;
                    self.results.clear();
                    display.emit(&DisplayEvent::ResultListCleared);
                    self.next_sample_at = now + interval;
                } else {
                    // Budget exhausted: record the failing tail and end.
                    self.append_result(&sample, display);
                    self.final_result = false;
                    self.stop_routine(clock, display);
                    return;
                }
            } else {
                self.next_sample_at = now + interval;
            }
        }

        if self.results.len() == RESULT_LIST_SIZE {
            self.final_result = true;
            self.stop_routine(clock, display);
        }
    }

    fn append_result(&mut self, sample: &TemperatureSample, display: &mut impl DisplaySink) {
        let line = report::result_line(self.results.len(), sample);
        match self.results.push(line.clone()) {
            Ok(()) => display.emit(&DisplayEvent::ResultLine(line)),
            Err(_) => self.result_overflow += 1,
        }
    }

    // ── Drains ────────────────────────────────────────────────

    fn save_routine(
        &mut self,
        _clock: &impl Clock,
        storage: &mut impl StoragePort,
        display: &mut impl DisplaySink,
    ) {
        if !self.results.is_empty() {
            let name = report::result_file_name(
                self.config.result_dir.as_str(),
                self.start_date,
                self.start_ms,
            );
            match storage.open(name.as_str()) {
                Err(e) => {
                    // Non-fatal: the list stays visible on the display
                    // and can still be printed.
                    warn!("sterilizer: result file open failed ({e})");
                    self.enter(SterilizerState::Stopped, display);
                    return;
                }
                Ok(()) => {
                    self.drain(&self.file_chan);
                    storage.request_close();
                    info!("sterilizer: result list saved to {}", name.as_str());
                }
            }
        }
        self.enter(SterilizerState::Stopped, display);
    }

    fn print_routine(&mut self, display: &mut impl DisplaySink) {
        if !self.results.is_empty() {
            self.drain(&self.print_chan);
            info!("sterilizer: result list sent to printer");
        }
        self.enter(SterilizerState::Stopped, display);
    }

    /// Push the full report into a line channel. The sequence is
    /// identical for both destinations.
    fn drain(&self, chan: &LineChannel) {
        self.push_line(chan, report::header(self.start_date, self.start_ms));
        self.push_line(chan, report::column_header());
        for line in &self.results {
            self.push_line(chan, line.clone());
        }
        self.push_line(chan, report::footer(self.end_ms, self.final_result));
    }

    /// Backpressure: retry with a bounded sleep until a slot frees up.
    /// A permanently wedged writer stalls this task, which is the
    /// accepted degradation mode — data is never dropped silently.
    fn push_line(&self, chan: &LineChannel, line: ReportLine) {
        loop {
            match chan.acquire_empty() {
                Some(mut slot) => {
                    slot.clear();
                    let _ = slot.push_str(line.as_str());
                    if let Err(item) = chan.submit_filled(slot) {
                        let _ = chan.release_empty(item);
                    }
                    return;
                }
                None => {
                    std::thread::sleep(Duration::from_micros(self.config.sterilizer_sleep_us));
                }
            }
        }
    }

    fn enter(&mut self, state: SterilizerState, display: &mut impl DisplaySink) {
        self.state = state;
        display.emit(&DisplayEvent::SterilizerState(state));
    }
}
