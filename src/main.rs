//! WaxSteril Firmware — Main Entry Point
//!
//! Priority-scheduled cooperating tasks over shared bounded buffers:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ acquisition task ──▶ temp FIFO ──▶ regulator task ──▶ heaters  │
//! │                                        │ snapshot              │
//! │                                        ▼                       │
//! │                                  sterilizer task               │
//! │                                   │         │                  │
//! │                              file chan   print chan            │
//! │                                   │         │                  │
//! │ regulator log ──▶ log chan ──▶ writer task  printer task       │
//! │                                                                │
//! │ faults ──▶ fault mailbox ──▶ main loop (supervisor, button,    │
//! │                              watchdog, diagnostics)            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use waxsteril::adapters::log_display::LogDisplay;
use waxsteril::adapters::printer::LinePrinter;
use waxsteril::adapters::storage::{FileStorage, SharedStorage};
use waxsteril::adapters::time::SystemClock;
use waxsteril::app::ports::FaultSink;
use waxsteril::buffer::LineChannel;
use waxsteril::config::SystemConfig;
use waxsteril::diagnostics::{BufferReport, DiagnosticsReport};
use waxsteril::drivers::button::{ButtonDriver, ButtonEvent};
use waxsteril::drivers::heater::HeaterBank;
use waxsteril::drivers::watchdog::Watchdog;
use waxsteril::drivers::hw_init;
use waxsteril::error::FaultCode;
use waxsteril::regulator::{RegulatorCore, RegulatorMailbox};
use waxsteril::safety::{FaultMailbox, MailboxFaultSink, SafetySupervisor};
use waxsteril::sensors::temperature::{self, TempReader};
use waxsteril::sensors::TempFifo;
use waxsteril::sterilizer::{SterilizerCore, SterilizerMailbox, SterilizerMsg};

/// SD card mount point; the config's log/result dirs live under it.
const STORAGE_ROOT: &str = "/sdcard";

/// Main loop tick (button scan, supervisor, watchdog).
const MAIN_TICK_MS: u64 = 100;

/// Hold the run button this long to reprint the last result list.
const LONG_PRESS_TICKS: u32 = 30;

/// Diagnostics dump cadence, in main-loop ticks.
const DIAG_EVERY_TICKS: u32 = 600;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("WaxSteril v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt; the
        // watchdog resets the board after its timeout.
        error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let watchdog = Watchdog::new();

    let config = SystemConfig::default();

    // ── 2. Shared plumbing ────────────────────────────────────
    let temp_fifo = Arc::new(TempFifo::new());
    let log_chan = Arc::new(LineChannel::new());
    let file_chan = Arc::new(LineChannel::new());
    let print_chan = Arc::new(LineChannel::new());

    let regulator_mb = Arc::new(RegulatorMailbox::new());
    let sterilizer_mb = Arc::new(SterilizerMailbox::new());
    let fault_mb = Arc::new(FaultMailbox::new());

    let regulator = RegulatorCore::new(
        config.clone(),
        Arc::clone(&regulator_mb),
        Arc::clone(&temp_fifo),
        Arc::clone(&log_chan),
    );
    let snapshot = regulator.snapshot();
    let sterilizer = SterilizerCore::new(
        config.clone(),
        Arc::clone(&sterilizer_mb),
        Arc::clone(&regulator_mb),
        snapshot,
        Arc::clone(&file_chan),
        Arc::clone(&print_chan),
    );

    let log_storage = SharedStorage::new(FileStorage::new(STORAGE_ROOT));
    let result_storage = SharedStorage::new(FileStorage::new(STORAGE_ROOT));

    // ── 3. Tasks ──────────────────────────────────────────────
    spawn_acquisition(&config, Arc::clone(&temp_fifo), Arc::clone(&sterilizer_mb), Arc::clone(&fault_mb));
    spawn_regulator(&config, regulator, log_storage.clone(), Arc::clone(&fault_mb));
    spawn_sterilizer(&config, sterilizer, result_storage.clone());
    spawn_writer(log_storage, Arc::clone(&log_chan), result_storage, Arc::clone(&file_chan));
    spawn_printer(Arc::clone(&print_chan));

    // ── 4. Main loop: supervisor, operator button, watchdog ───
    let mut supervisor = SafetySupervisor::new();
    let mut display = LogDisplay::new();
    let mut faults = MailboxFaultSink::new(Arc::clone(&fault_mb));
    let mut button = ButtonDriver::new(LONG_PRESS_TICKS);
    let mut fuse_blown = [false; waxsteril::config::CHANNEL_COUNT];
    let mut run_commanded = false;
    let mut tick: u32 = 0;

    loop {
        watchdog.feed();
        tick = tick.wrapping_add(1);

        // Fuse sense: rising edge per channel raises a control fault.
        for (ch, gpio) in waxsteril::pins::FUSE_SENSE_GPIOS.iter().enumerate() {
            let blown = hw_init::gpio_read(*gpio);
            if blown && !fuse_blown[ch] {
                faults.post(FaultCode::fuse(ch));
            }
            fuse_blown[ch] = blown;
        }

        match button.poll(hw_init::gpio_read(waxsteril::pins::BUTTON_GPIO)) {
            Some(ButtonEvent::ShortPress) => {
                run_commanded = !run_commanded;
                let msg = if run_commanded { SterilizerMsg::Start } else { SterilizerMsg::Stop };
                if sterilizer_mb.post(msg).is_err() {
                    warn!("sterilizer mailbox full, operator command dropped");
                }
            }
            Some(ButtonEvent::LongPress) => {
                if sterilizer_mb.post(SterilizerMsg::Print).is_err() {
                    warn!("sterilizer mailbox full, print request dropped");
                }
            }
            None => {}
        }

        supervisor.service(&fault_mb, &regulator_mb, &sterilizer_mb, &mut display);

        if tick % DIAG_EVERY_TICKS == 0 {
            let report = DiagnosticsReport {
                temp_fifo: BufferReport::of(&temp_fifo),
                log_chan: BufferReport::of(&log_chan),
                file_chan: BufferReport::of(&file_chan),
                print_chan: BufferReport::of(&print_chan),
                regulator_dropped_msgs: regulator_mb.dropped(),
                sterilizer_dropped_msgs: sterilizer_mb.dropped(),
                fault_dropped_msgs: fault_mb.dropped(),
                latched_faults: supervisor.latched(),
                fuzzy_faults: supervisor.fuzzy_errors(),
            };
            info!("diag {}", report.to_json());
        }

        thread::sleep(Duration::from_millis(MAIN_TICK_MS));
    }
}

// ── Task spawners ─────────────────────────────────────────────

fn spawn_acquisition(
    config: &SystemConfig,
    fifo: Arc<TempFifo>,
    sterilizer_mb: Arc<SterilizerMailbox>,
    fault_mb: Arc<FaultMailbox>,
) {
    let config = config.clone();
    let _ = thread::Builder::new()
        .name("tempreader".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            let clock = SystemClock::new();
            let mut reader = TempReader::new(&config);
            let mut faults = MailboxFaultSink::new(fault_mb);
            let mut announced = false;
            loop {
                match reader.sample(&clock) {
                    Ok(sample) => {
                        if !announced {
                            announced = true;
                            if sterilizer_mb.post(SterilizerMsg::SensorsReady).is_err() {
                                warn!("sterilizer mailbox full, SensorsReady delayed");
                                announced = false;
                            }
                        }
                        if !temperature::publish(&fifo, sample) {
                            warn!("temperature FIFO full, sample dropped");
                        }
                    }
                    Err((ch, e)) => {
                        warn!("sensor {ch} read failed: {e}");
                        faults.post(FaultCode::sensor(ch));
                    }
                }
                thread::sleep(Duration::from_millis(u64::from(config.sample_interval_ms)));
            }
        });
}

fn spawn_regulator(
    config: &SystemConfig,
    mut core: RegulatorCore,
    mut log_storage: SharedStorage,
    fault_mb: Arc<FaultMailbox>,
) {
    let sleep_us = config.regulator_sleep_us;
    let _ = thread::Builder::new()
        .name("regulator".into())
        .stack_size(16 * 1024)
        .spawn(move || {
            let clock = SystemClock::new();
            let mut heaters = HeaterBank::new();
            let mut display = LogDisplay::new();
            let mut faults = MailboxFaultSink::new(fault_mb);
            loop {
                core.poll(&clock, &mut heaters, &mut log_storage, &mut display, &mut faults);
                thread::sleep(Duration::from_micros(sleep_us));
            }
        });
}

fn spawn_sterilizer(config: &SystemConfig, mut core: SterilizerCore, mut storage: SharedStorage) {
    let sleep_us = config.sterilizer_sleep_us;
    let _ = thread::Builder::new()
        .name("sterilizer".into())
        .stack_size(16 * 1024)
        .spawn(move || {
            let clock = SystemClock::new();
            let mut display = LogDisplay::new();
            loop {
                core.poll(&clock, &mut storage, &mut display);
                thread::sleep(Duration::from_micros(sleep_us));
            }
        });
}

fn spawn_writer(
    log_storage: SharedStorage,
    log_chan: Arc<LineChannel>,
    result_storage: SharedStorage,
    file_chan: Arc<LineChannel>,
) {
    let _ = thread::Builder::new()
        .name("cardwriter".into())
        .stack_size(8 * 1024)
        .spawn(move || loop {
            log_storage.service(&log_chan);
            result_storage.service(&file_chan);
            thread::sleep(Duration::from_millis(10));
        });
}

fn spawn_printer(print_chan: Arc<LineChannel>) {
    let _ = thread::Builder::new()
        .name("printer".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            let mut printer = LinePrinter::new();
            loop {
                printer.service(&print_chan);
                thread::sleep(Duration::from_millis(10));
            }
        });
}
