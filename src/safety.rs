//! Safety supervisor.
//!
//! The collaborator on the far side of the [`FaultSink`] port. Control
//! faults (sensor failures, blown fuses, critical temperature, critical
//! rate of change) latch here: the first occurrence shuts heating down
//! by posting `Disable` ahead of anything queued in the regulator
//! mailbox and `StopOnError` to the sterilizer. Latched faults stay
//! latched until an explicit external reset — there is no self-retry
//! out of a control fault.
//!
//! Fuzzification errors are computation-domain: counted and displayed,
//! never latched, and heating continues.

use std::sync::Arc;

use log::{error, info, warn};

use crate::app::events::DisplayEvent;
use crate::app::ports::{DisplaySink, FaultSink};
use crate::config::FAULT_MAILBOX_SIZE;
use crate::error::FaultCode;
use crate::mailbox::Mailbox;
use crate::regulator::{RegulatorMailbox, RegulatorMsg};
use crate::sterilizer::{SterilizerMailbox, SterilizerMsg};

/// Mailbox feeding fault codes to the supervisor task.
pub type FaultMailbox = Mailbox<FaultCode, FAULT_MAILBOX_SIZE>;

/// Non-blocking [`FaultSink`] handed to the control cores: posts into
/// the supervisor's mailbox, dropping (counted) when it is full.
pub struct MailboxFaultSink {
    mailbox: Arc<FaultMailbox>,
}

impl MailboxFaultSink {
    pub fn new(mailbox: Arc<FaultMailbox>) -> Self {
        Self { mailbox }
    }
}

impl FaultSink for MailboxFaultSink {
    fn post(&mut self, code: FaultCode) {
        if self.mailbox.post(code).is_err() {
            warn!("fault mailbox full, dropped {code}");
        }
    }
}

/// Latched-fault supervisor.
pub struct SafetySupervisor {
    latched: u16,
    fuzzy_errors: u32,
}

impl Default for SafetySupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self { latched: 0, fuzzy_errors: 0 }
    }

    /// Process one fault code. Returns `true` when a heating shutdown
    /// must be issued — exactly once per newly latched control fault.
    pub fn report(&mut self, code: FaultCode) -> bool {
        if !code.is_control_fault() {
            self.fuzzy_errors += 1;
            info!("fault (diagnostic): {code}");
            return false;
        }
        if self.latched & code.mask() != 0 {
            return false;
        }
        self.latched |= code.mask();
        error!("FAULT LATCHED: {code}");
        true
    }

    /// Drain the fault mailbox and dispatch shutdowns. Runs in the
    /// supervisor task once per cycle.
    pub fn service(
        &mut self,
        faults: &FaultMailbox,
        regulator: &RegulatorMailbox,
        sterilizer: &SterilizerMailbox,
        display: &mut impl DisplaySink,
    ) {
        while let Some(code) = faults.try_fetch() {
            display.emit(&DisplayEvent::Fault(code));
            if self.report(code) {
                // Disable preempts queued Start/Stop deterministically.
                if regulator.post_ahead(RegulatorMsg::Disable).is_err() {
                    warn!("regulator mailbox full, Disable delayed");
                }
                if sterilizer.post(SterilizerMsg::StopOnError).is_err() {
                    warn!("sterilizer mailbox full, StopOnError delayed");
                }
            }
        }
    }

    pub fn latched(&self) -> u16 {
        self.latched
    }

    pub fn has_fault(&self, code: FaultCode) -> bool {
        self.latched & code.mask() != 0
    }

    pub fn has_faults(&self) -> bool {
        self.latched != 0
    }

    /// Fuzzification errors seen since the last reset.
    pub fn fuzzy_errors(&self) -> u32 {
        self.fuzzy_errors
    }

    /// External reset: clears every latch. The operator acknowledges
    /// the fault on the panel and power-cycles the heating task.
    pub fn reset(&mut self) {
        if self.latched != 0 {
            info!("supervisor: latched faults cleared by external reset");
        }
        self.latched = 0;
        self.fuzzy_errors = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDisplay;

    impl DisplaySink for NullDisplay {
        fn emit(&mut self, _event: &DisplayEvent) {}
    }

    #[test]
    fn control_fault_latches_exactly_once() {
        let mut sup = SafetySupervisor::new();
        assert!(sup.report(FaultCode::CriticalTemp));
        assert!(!sup.report(FaultCode::CriticalTemp));
        assert!(sup.has_fault(FaultCode::CriticalTemp));

        // A different control fault still triggers its own shutdown.
        assert!(sup.report(FaultCode::Sensor1));
        assert_eq!(
            sup.latched(),
            FaultCode::CriticalTemp.mask() | FaultCode::Sensor1.mask()
        );
    }

    #[test]
    fn fuzzy_errors_are_counted_not_latched() {
        let mut sup = SafetySupervisor::new();
        assert!(!sup.report(FaultCode::FuzzyLogic));
        assert!(!sup.report(FaultCode::FuzzyLogic));
        assert_eq!(sup.fuzzy_errors(), 2);
        assert!(!sup.has_faults());
    }

    #[test]
    fn reset_clears_latches() {
        let mut sup = SafetySupervisor::new();
        let _ = sup.report(FaultCode::CriticalRate);
        sup.reset();
        assert!(!sup.has_faults());
        // After a reset the same fault latches (and shuts down) again.
        assert!(sup.report(FaultCode::CriticalRate));
    }

    #[test]
    fn service_posts_disable_ahead_and_stop_on_error() {
        let mut sup = SafetySupervisor::new();
        let faults = FaultMailbox::new();
        let regulator = RegulatorMailbox::new();
        let sterilizer = SterilizerMailbox::new();

        // Queued Start must lose to the Disable that the fault causes.
        regulator.post(RegulatorMsg::Start).unwrap();
        faults.post(FaultCode::CriticalTemp).unwrap();

        sup.service(&faults, &regulator, &sterilizer, &mut NullDisplay);
        assert_eq!(regulator.try_fetch(), Some(RegulatorMsg::Disable));
        assert_eq!(regulator.try_fetch(), Some(RegulatorMsg::Start));
        assert_eq!(sterilizer.try_fetch(), Some(SterilizerMsg::StopOnError));
    }

    #[test]
    fn already_latched_fault_does_not_redispatch() {
        let mut sup = SafetySupervisor::new();
        let faults = FaultMailbox::new();
        let regulator = RegulatorMailbox::new();
        let sterilizer = SterilizerMailbox::new();

        faults.post(FaultCode::CriticalTemp).unwrap();
        faults.post(FaultCode::CriticalTemp).unwrap();
        sup.service(&faults, &regulator, &sterilizer, &mut NullDisplay);

        assert_eq!(regulator.len(), 1);
        assert_eq!(sterilizer.len(), 1);
    }
}
