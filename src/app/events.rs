//! Outbound display notifications.
//!
//! The control cores emit these through the
//! [`DisplaySink`](super::ports::DisplaySink) port. Adapters on the
//! other side decide what to do with them — draw on the panel LCD,
//! log to serial, or record in tests.

use crate::app::ports::DateStamp;
use crate::buffer::ReportLine;
use crate::config::CHANNEL_COUNT;
use crate::error::FaultCode;
use crate::regulator::RegulatorState;
use crate::sterilizer::SterilizerState;

/// Structured events pushed to the display collaborator.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    /// New per-channel heater duty percentages.
    HeatPower([u8; CHANNEL_COUNT]),

    /// Latest per-channel temperatures (raw counts).
    CurrentTemp([i16; CHANNEL_COUNT]),

    /// The regulator changed state.
    RegulatorState(RegulatorState),

    /// The sterilization process changed state.
    SterilizerState(SterilizerState),

    /// A new line was appended to the result list.
    ResultLine(ReportLine),

    /// The result list was cleared (run restart or tolerated swing).
    ResultListCleared,

    /// A sterilization run started.
    RunStarted { date: DateStamp, start_ms: u32 },

    /// A sterilization run ended.
    RunEnded { end_ms: u32, success: bool },

    /// A fault was raised; shown as an operator-visible error string.
    Fault(FaultCode),
}
