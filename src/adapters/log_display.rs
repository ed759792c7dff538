//! Log-based display adapter.
//!
//! Implements [`DisplaySink`] by writing the panel notifications to the
//! ESP-IDF logger (UART / USB-CDC in production). The LCD panel board
//! implements the same trait on its own link.

use log::info;

use crate::app::events::DisplayEvent;
use crate::app::ports::DisplaySink;
use crate::config::TEMP_QUANTUM;
use crate::sterilizer::report::hms;

/// Adapter that logs every [`DisplayEvent`] to the serial console.
pub struct LogDisplay;

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl LogDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySink for LogDisplay {
    fn emit(&mut self, event: &DisplayEvent) {
        match event {
            DisplayEvent::HeatPower(duty) => {
                info!("PANEL | heat {}% {}% {}%", duty[0], duty[1], duty[2]);
            }
            DisplayEvent::CurrentTemp(temp) => {
                let c = |raw: i16| f32::from(raw) * TEMP_QUANTUM;
                info!(
                    "PANEL | temp {:.1}C {:.1}C {:.1}C",
                    c(temp[0]),
                    c(temp[1]),
                    c(temp[2]),
                );
            }
            DisplayEvent::RegulatorState(state) => {
                info!("PANEL | regulator {:?}", state);
            }
            DisplayEvent::SterilizerState(state) => {
                info!("PANEL | sterilizer {:?}", state);
            }
            DisplayEvent::ResultLine(line) => {
                info!("PANEL | result {}", line.trim_end());
            }
            DisplayEvent::ResultListCleared => {
                info!("PANEL | result list cleared");
            }
            DisplayEvent::RunStarted { date, start_ms } => {
                let (h, m, s) = hms(*start_ms);
                info!(
                    "PANEL | run started {}.{:02}.{:02} {:02}:{:02}:{:02}",
                    date.year, date.month, date.day, h, m, s,
                );
            }
            DisplayEvent::RunEnded { end_ms, success } => {
                let (h, m, s) = hms(*end_ms);
                info!(
                    "PANEL | run ended {:02}:{:02}:{:02} {}",
                    h,
                    m,
                    s,
                    if *success { "SUCCESS" } else { "FAILURE" },
                );
            }
            DisplayEvent::Fault(code) => {
                info!("PANEL | fault: {code}");
            }
        }
    }
}
