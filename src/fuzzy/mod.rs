//! Fuzzy-logic heating controller core.
//!
//! Pure computation, no shared state beyond the static rule table:
//! fuzzification of two crisp inputs (temperature and temperature delta,
//! in raw sensor counts) against piecewise-linear membership functions,
//! min-AND rule evaluation, and centre-of-singletons defuzzification to
//! a heater duty percentage.
//!
//! ```text
//! (temp, dtemp) ── fuzzify ──▶ [RuleDegrees; 14]
//!                ── evaluate ──▶ [fire strength; 14]
//!                ── defuzzify ──▶ duty percent (or None if no rule fired)
//! ```
//!
//! An undefined membership evaluation (malformed breakpoints) is a
//! diagnosable error, never a value: it zeroes the rule's strength,
//! increments the engine error counter and is recorded per rule and
//! per input for the diagnostics report.

pub mod rules;

use crate::config::RULE_COUNT;

// ---------------------------------------------------------------------------
// Membership functions
// ---------------------------------------------------------------------------

/// The four membership shapes used by the regulator, as a closed variant
/// so evaluation is an exhaustive match. All shapes are piecewise linear
/// over integer breakpoints in raw sensor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipFunction {
    /// Linear ramp up from `from` to 1 at `peak`, then down to 0 at `to`.
    Triangle { from: i16, peak: i16, to: i16 },
    /// 0 below `from`, linear ramp up, saturates at 1 above `to`.
    HalfTrapRising { from: i16, to: i16 },
    /// 1 below `from`, linear ramp down, 0 above `to`.
    HalfTrapFalling { from: i16, to: i16 },
    /// Ramp up to a flat plateau at 1 between `rise_to` and `fall_from`,
    /// then ramp down.
    Trapezoid {
        from: i16,
        rise_to: i16,
        fall_from: i16,
        to: i16,
    },
}

impl MembershipFunction {
    /// Degree of membership of `x`, in `[0, 1]`.
    ///
    /// `None` is the undefined sentinel: the breakpoints do not cover
    /// `x` (zero-width ramp or a gap in a malformed shape). It must be
    /// distinguished from `Some(0.0)`, which means "fully excluded".
    pub fn degree(&self, x: i16) -> Option<f32> {
        let ramp = |num: i16, den: i16| {
            if den == 0 {
                None
            } else {
                Some(f32::from(num) / f32::from(den))
            }
        };
        match *self {
            Self::Triangle { from, peak, to } => {
                if x < from || x > to {
                    Some(0.0)
                } else if x <= peak {
                    ramp(x - from, peak - from)
                } else {
                    ramp(to - x, to - peak)
                }
            }
            Self::HalfTrapRising { from, to } => {
                if x < from {
                    Some(0.0)
                } else if x > to {
                    Some(1.0)
                } else {
                    ramp(x - from, to - from)
                }
            }
            Self::HalfTrapFalling { from, to } => {
                if x < from {
                    Some(1.0)
                } else if x > to {
                    Some(0.0)
                } else {
                    ramp(to - x, to - from)
                }
            }
            Self::Trapezoid {
                from,
                rise_to,
                fall_from,
                to,
            } => {
                if x < from || x > to {
                    Some(0.0)
                } else if x < rise_to {
                    ramp(x - from, rise_to - from)
                } else if x <= fall_from {
                    Some(1.0)
                } else {
                    ramp(to - x, to - fall_from)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rules and degrees
// ---------------------------------------------------------------------------

/// One fuzzy rule: up to two antecedents (absent = don't-care) and a
/// singleton consequent duty percentage.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyRule {
    pub temp: Option<MembershipFunction>,
    pub dtemp: Option<MembershipFunction>,
    /// Consequent singleton, duty percent (0..=100).
    pub duty: u8,
}

/// Degree of one antecedent for one rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Degree {
    /// Valid membership degree in `[0, 1]`.
    Membership(f32),
    /// The rule has no antecedent on this input.
    DontCare,
    /// Membership evaluation failed — a fuzzification error.
    Undefined,
}

/// Per-rule degrees for both inputs.
#[derive(Debug, Clone, Copy)]
pub struct RuleDegrees {
    pub temp: Degree,
    pub dtemp: Degree,
}

/// Index of the temperature input in the error matrix.
pub const INPUT_TEMP: usize = 0;
/// Index of the delta-temperature input in the error matrix.
pub const INPUT_DTEMP: usize = 1;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Fuzzy inference engine over the static rule table.
///
/// The engine itself only accumulates error diagnostics; all inference
/// state lives on the stack of each call.
pub struct FuzzyEngine {
    errors: [[bool; RULE_COUNT]; 2],
    error_count: u32,
}

impl Default for FuzzyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyEngine {
    pub fn new() -> Self {
        Self {
            errors: [[false; RULE_COUNT]; 2],
            error_count: 0,
        }
    }

    /// Evaluate both antecedents of every rule at the crisp inputs.
    pub fn fuzzify(&self, temp: i16, dtemp: i16) -> [RuleDegrees; RULE_COUNT] {
        let eval = |mf: Option<MembershipFunction>, x: i16| match mf {
            None => Degree::DontCare,
            Some(mf) => match mf.degree(x) {
                Some(d) => Degree::Membership(d),
                None => Degree::Undefined,
            },
        };
        core::array::from_fn(|i| {
            let rule = &rules::RULES[i];
            RuleDegrees {
                temp: eval(rule.temp, temp),
                dtemp: eval(rule.dtemp, dtemp),
            }
        })
    }

    /// Fire strength per rule: the minimum (AND) of the antecedent
    /// degrees; a don't-care antecedent drops out of the minimum. An
    /// undefined degree zeroes the rule and is recorded as an error.
    pub fn evaluate(&mut self, degrees: &[RuleDegrees; RULE_COUNT]) -> [f32; RULE_COUNT] {
        let mut strengths = [0.0f32; RULE_COUNT];
        for (i, d) in degrees.iter().enumerate() {
            if matches!(d.temp, Degree::Undefined) {
                self.record_error(INPUT_TEMP, i);
            }
            if matches!(d.dtemp, Degree::Undefined) {
                self.record_error(INPUT_DTEMP, i);
            }
            strengths[i] = match (d.temp, d.dtemp) {
                (Degree::Membership(t), Degree::Membership(dt)) => t.min(dt),
                (Degree::Membership(t), Degree::DontCare) => t,
                (Degree::DontCare, Degree::Membership(dt)) => dt,
                // A rule with no antecedents cannot fire, and an
                // undefined degree must not become a valid strength.
                _ => 0.0,
            };
        }
        strengths
    }

    /// Weighted average of the consequent singletons.
    ///
    /// `None` when no rule fired (zero strength sum): the caller must
    /// apply its own fallback instead of dividing by zero.
    pub fn defuzzify(&self, strengths: &[f32; RULE_COUNT]) -> Option<u8> {
        let mut weighted = 0.0f32;
        let mut total = 0.0f32;
        for (i, &s) in strengths.iter().enumerate() {
            weighted += s * f32::from(rules::RULES[i].duty);
            total += s;
        }
        if total <= 0.0 {
            return None;
        }
        Some((weighted / total) as u8)
    }

    /// Full inference chain for one channel.
    pub fn compute(&mut self, temp: i16, dtemp: i16) -> Option<u8> {
        let degrees = self.fuzzify(temp, dtemp);
        let strengths = self.evaluate(&degrees);
        self.defuzzify(&strengths)
    }

    /// Total fuzzification errors since the last reset.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Per-input, per-rule error flags for diagnostics.
    pub fn error_matrix(&self) -> &[[bool; RULE_COUNT]; 2] {
        &self.errors
    }

    /// Clear error diagnostics (regulator start routine).
    pub fn reset_errors(&mut self) {
        self.errors = [[false; RULE_COUNT]; 2];
        self.error_count = 0;
    }

    fn record_error(&mut self, input: usize, rule: usize) {
        self.errors[input][rule] = true;
        self.error_count += 1;
    }
}
