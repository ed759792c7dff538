//! Production membership functions and rule table.
//!
//! Breakpoints are raw sensor counts (1/128 degC). The temperature
//! universe is carved into melting / cold / medium / hot / sterile bands
//! around the wax melting point (65 degC) and the sterile hold band
//! (114..116 degC); the delta universe covers one sampling period's
//! temperature travel in counts.

use super::{FuzzyRule, MembershipFunction};
use crate::config::RULE_COUNT;

// --- Temperature input (counts; 8320 = 65 degC, 14848 = 116 degC) ----------

pub const TEMP_MELTING: MembershipFunction =
    MembershipFunction::HalfTrapFalling { from: 8320, to: 9600 };
pub const TEMP_COLD: MembershipFunction = MembershipFunction::Triangle {
    from: 8320,
    peak: 9600,
    to: 10_880,
};
pub const TEMP_MEDIUM: MembershipFunction = MembershipFunction::Triangle {
    from: 9600,
    peak: 10_880,
    to: 14_848,
};
pub const TEMP_HOT: MembershipFunction =
    MembershipFunction::HalfTrapRising { from: 10_880, to: 14_848 };
pub const TEMP_STERILE: MembershipFunction = MembershipFunction::Trapezoid {
    from: 14_592,
    rise_to: 14_592,
    fall_from: 14_848,
    to: 14_848,
};

// --- Delta-temperature input (counts per sampling period) -------------------

pub const DTEMP_NEG: MembershipFunction = MembershipFunction::HalfTrapFalling { from: -1, to: 0 };
pub const DTEMP_ZERO: MembershipFunction = MembershipFunction::Triangle {
    from: -1,
    peak: 0,
    to: 2,
};
pub const DTEMP_SPOS: MembershipFunction = MembershipFunction::Triangle {
    from: 0,
    peak: 2,
    to: 4,
};
pub const DTEMP_POS: MembershipFunction = MembershipFunction::Triangle {
    from: 2,
    peak: 4,
    to: 6,
};
pub const DTEMP_VPOS: MembershipFunction = MembershipFunction::HalfTrapRising { from: 4, to: 6 };

// --- Output singletons (duty percent) ---------------------------------------

pub const DUTY_OFF: u8 = 0;
pub const DUTY_SMALL: u8 = 25;
pub const DUTY_HALF: u8 = 50;
pub const DUTY_WIDE: u8 = 75;
pub const DUTY_FULL: u8 = 100;

// --- Rule table --------------------------------------------------------------

/// The 14 regulator rules. Melting and hot ignore the delta input.
pub static RULES: [FuzzyRule; RULE_COUNT] = [
    FuzzyRule { temp: Some(TEMP_MELTING), dtemp: None, duty: DUTY_FULL },
    FuzzyRule { temp: Some(TEMP_COLD), dtemp: Some(DTEMP_NEG), duty: DUTY_FULL },
    FuzzyRule { temp: Some(TEMP_COLD), dtemp: Some(DTEMP_ZERO), duty: DUTY_FULL },
    FuzzyRule { temp: Some(TEMP_COLD), dtemp: Some(DTEMP_SPOS), duty: DUTY_WIDE },
    FuzzyRule { temp: Some(TEMP_COLD), dtemp: Some(DTEMP_POS), duty: DUTY_HALF },
    FuzzyRule { temp: Some(TEMP_COLD), dtemp: Some(DTEMP_VPOS), duty: DUTY_SMALL },
    FuzzyRule { temp: Some(TEMP_MEDIUM), dtemp: Some(DTEMP_NEG), duty: DUTY_FULL },
    FuzzyRule { temp: Some(TEMP_MEDIUM), dtemp: Some(DTEMP_ZERO), duty: DUTY_WIDE },
    FuzzyRule { temp: Some(TEMP_MEDIUM), dtemp: Some(DTEMP_SPOS), duty: DUTY_HALF },
    FuzzyRule { temp: Some(TEMP_MEDIUM), dtemp: Some(DTEMP_POS), duty: DUTY_SMALL },
    FuzzyRule { temp: Some(TEMP_MEDIUM), dtemp: Some(DTEMP_VPOS), duty: DUTY_OFF },
    FuzzyRule { temp: Some(TEMP_HOT), dtemp: None, duty: DUTY_OFF },
    FuzzyRule { temp: Some(TEMP_STERILE), dtemp: Some(DTEMP_NEG), duty: DUTY_WIDE },
    FuzzyRule { temp: Some(TEMP_STERILE), dtemp: Some(DTEMP_ZERO), duty: DUTY_SMALL },
];
