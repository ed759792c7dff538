//! System configuration parameters
//!
//! All tunable parameters for the WaxSteril appliance. Fixed structural
//! capacities (buffer, mailbox, result-list sizes) are compile-time
//! constants; everything a service technician may retune lives in
//! [`SystemConfig`].

use serde::{Deserialize, Serialize};

/// Number of heating channels / temperature sensors.
pub const CHANNEL_COUNT: usize = 3;

/// Capacity of the temperature sample FIFO between the acquisition task
/// and the regulator.
pub const TEMP_FIFO_SIZE: usize = 4;

/// Capacity of the file and printer line channels.
pub const LINE_CHANNEL_SIZE: usize = 10;

/// Maximum length of one formatted output line (report or log).
pub const LINE_CAP: usize = 64;

/// Capacity of the per-task control mailboxes.
pub const MAILBOX_SIZE: usize = 10;

/// Capacity of the fault mailbox feeding the safety supervisor.
pub const FAULT_MAILBOX_SIZE: usize = 20;

/// One result-list slot per save interval over the full run duration.
pub const RESULT_LIST_SIZE: usize = 61;

/// Number of fuzzy rules in the regulator rule table.
pub const RULE_COUNT: usize = 14;

/// One raw sensor count in degrees Celsius (16-bit ADT7410 resolution).
pub const TEMP_QUANTUM: f32 = 0.007_812_5;

/// Milliseconds in a day — sample timestamps wrap at local midnight.
pub const DAY_MS: u32 = 86_400_000;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sampling ---
    /// Temperature sampling period (milliseconds).
    pub sample_interval_ms: u32,
    /// Result-list save cadence while a run is active (seconds).
    pub save_interval_s: u32,

    // --- Temperatures (raw sensor counts, 1/128 degC) ---
    /// Hard ceiling; at or above this the heater is shut down (125 degC).
    pub critical_temp_raw: i16,
    /// Upper bound of the melting phase (75 degC).
    pub melting_end_raw: i16,
    /// All channels at or above this count as sterile (114 degC).
    pub sterile_temp_raw: i16,

    // --- Rate anomaly ---
    /// Minimum temperature travel before a slope is computed (0.5 degC).
    pub min_track_delta_raw: i16,
    /// Critical rate of change (degC per second).
    pub critical_tg_alpha: f32,

    // --- Run policy ---
    /// Tolerated non-sterile swings per run before the run fails.
    pub max_temp_swings: u8,

    // --- Task timing ---
    /// Regulator polling-loop sleep (microseconds).
    pub regulator_sleep_us: u64,
    /// Sterilizer polling-loop sleep (microseconds).
    pub sterilizer_sleep_us: u64,

    // --- Output paths ---
    /// Directory for regulator cycle logs.
    pub log_dir: heapless::String<32>,
    /// Directory for sterilization result reports.
    pub result_dir: heapless::String<32>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sampling
            sample_interval_ms: 1000, // 1 Hz acquisition
            save_interval_s: 60,      // one result line per minute

            // Temperatures
            critical_temp_raw: 16_000,
            melting_end_raw: 9_600,
            sterile_temp_raw: 14_592,

            // Rate anomaly
            min_track_delta_raw: 64,
            critical_tg_alpha: 0.1,

            // Run policy
            max_temp_swings: 5,

            // Task timing
            regulator_sleep_us: 10_000,
            sterilizer_sleep_us: 10_000,

            // Output paths
            log_dir: heapless::String::try_from("/logs").unwrap_or_default(),
            result_dir: heapless::String::try_from("/results").unwrap_or_default(),
        }
    }
}
