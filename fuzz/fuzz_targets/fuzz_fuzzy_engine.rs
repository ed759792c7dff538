//! Fuzz the full inference chain: for any crisp input pair the engine
//! must produce a valid duty (or None) without errors or panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use waxsteril::fuzzy::FuzzyEngine;

fuzz_target!(|input: (i16, i16)| {
    let (temp, dtemp) = input;
    let mut engine = FuzzyEngine::new();
    if let Some(duty) = engine.compute(temp, dtemp) {
        assert!(duty <= 100, "duty {duty} out of range for ({temp}, {dtemp})");
    }
    assert_eq!(
        engine.error_count(),
        0,
        "production rule table must be total"
    );
});
