//! End-to-end sterilization runs: snapshot in, result list and report
//! drains out.
//!
//! Note on poll granularity: a control message is fetched at the top of
//! a poll and the state work runs in the same pass, so a Stop message
//! followed by a small drain completes within one poll. The
//! capacity/failure transitions happen inside the sampling work, so
//! their drains run on the following poll.

use std::sync::{Arc, Mutex};

use waxsteril::buffer::LineChannel;
use waxsteril::config::{CHANNEL_COUNT, RESULT_LIST_SIZE, SystemConfig};
use waxsteril::regulator::{RegulatorMailbox, RegulatorMsg};
use waxsteril::sensors::TemperatureSample;
use waxsteril::sterilizer::{SterilizerCore, SterilizerMailbox, SterilizerMsg, SterilizerState};

use crate::mock_hw::{FixedClock, MockStorage, RecordingDisplay, spawn_collector};

const STERILE_RAW: i16 = 14_592;

struct Rig {
    core: SterilizerCore,
    mailbox: Arc<SterilizerMailbox>,
    regulator: Arc<RegulatorMailbox>,
    snapshot: Arc<Mutex<TemperatureSample>>,
    file_chan: Arc<LineChannel>,
    print_chan: Arc<LineChannel>,
    clock: FixedClock,
    storage: MockStorage,
    display: RecordingDisplay,
}

impl Rig {
    fn new() -> Self {
        let mailbox = Arc::new(SterilizerMailbox::new());
        let regulator = Arc::new(RegulatorMailbox::new());
        let snapshot = Arc::new(Mutex::new(TemperatureSample::default()));
        let file_chan = Arc::new(LineChannel::new());
        let print_chan = Arc::new(LineChannel::new());
        let core = SterilizerCore::new(
            SystemConfig::default(),
            Arc::clone(&mailbox),
            Arc::clone(&regulator),
            Arc::clone(&snapshot),
            Arc::clone(&file_chan),
            Arc::clone(&print_chan),
        );
        Self {
            core,
            mailbox,
            regulator,
            snapshot,
            file_chan,
            print_chan,
            clock: FixedClock::new(),
            storage: MockStorage::default(),
            display: RecordingDisplay::default(),
        }
    }

    fn poll(&mut self) {
        self.core
            .poll(&self.clock, &mut self.storage, &mut self.display);
    }

    fn ready_and_start(&mut self) {
        self.mailbox.post(SterilizerMsg::SensorsReady).unwrap();
        self.poll();
        self.mailbox.post(SterilizerMsg::Start).unwrap();
        self.poll();
        assert_eq!(self.core.state(), SterilizerState::Active);
        // The regulator saw its Start command.
        assert_eq!(self.regulator.try_fetch(), Some(RegulatorMsg::Start));
    }

    fn set_snapshot(&self, sterile: bool) {
        let mut snap = self.snapshot.lock().unwrap();
        *snap = TemperatureSample {
            timestamp_ms: self.clock.midnight_ms.get(),
            temp: [if sterile { STERILE_RAW } else { 14_000 }; CHANNEL_COUNT],
            dtemp: [0; CHANNEL_COUNT],
            sterile,
        };
    }

    /// One save-interval step: advance to the next cadence slot,
    /// publish a snapshot, poll.
    fn step(&mut self, sterile: bool) {
        self.clock.advance_ms(60_000);
        self.set_snapshot(sterile);
        self.poll();
    }
}

#[test]
fn full_hour_of_sterile_samples_is_a_success() {
    let mut rig = Rig::new();
    rig.ready_and_start();

    for _ in 0..RESULT_LIST_SIZE {
        assert_eq!(rig.core.state(), SterilizerState::Active);
        rig.step(true);
    }
    assert_eq!(rig.core.state(), SterilizerState::Saving);
    assert_eq!(rig.core.result_count(), RESULT_LIST_SIZE);
    assert!(rig.core.final_result());

    let collector = spawn_collector(Arc::clone(&rig.file_chan));
    rig.poll(); // Saving drains and returns to Stopped
    let bytes = collector.join().unwrap();
    assert_eq!(rig.core.state(), SterilizerState::Stopped);
    assert_eq!(rig.storage.opens.len(), 1);
    assert!(rig.storage.opens[0].starts_with("/results/2024_03_09_12_00_00"));
    assert_eq!(rig.storage.close_requests, 1);

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("Date: 2024.03.09\nStart: 12:00:00\n"));
    assert!(text.contains("Nr.\tTime\t\tCH0\tCH1\tCH2\tStatus\n"));
    assert_eq!(text.matches("Sterile\n").count(), RESULT_LIST_SIZE);
    assert!(text.ends_with("Result: SUCCESS\n"));

    // The in-memory list survives the save for display and reprint.
    assert_eq!(rig.core.result_count(), RESULT_LIST_SIZE);
}

#[test]
fn swings_beyond_the_budget_fail_the_run() {
    let mut rig = Rig::new();
    rig.ready_and_start();
    let budget = SystemConfig::default().max_temp_swings;

    // Each tolerated swing needs a non-empty list, so alternate one
    // sterile sample with one non-sterile sample.
    for expected_swings in 1..=(budget + 1) {
        rig.step(true);
        assert!(rig.core.result_count() > 0);
        rig.step(false);
        assert_eq!(rig.core.swings(), expected_swings);
        assert_eq!(rig.core.result_count(), 0, "tolerated swing clears the list");
        assert_eq!(rig.core.state(), SterilizerState::Active);
    }

    // Budget consumed: the next swing is a genuine failure.
    rig.step(true);
    rig.step(false);
    assert_eq!(rig.core.state(), SterilizerState::Saving);
    assert!(!rig.core.final_result());
    // The list holds only the tail: last sterile sample + failing sample.
    assert_eq!(rig.core.result_count(), 2);

    let collector = spawn_collector(Arc::clone(&rig.file_chan));
    rig.poll();
    let text = String::from_utf8(collector.join().unwrap()).unwrap();
    assert!(text.contains("Failure\n"));
    assert!(text.ends_with("Result: FAILURE\n"));
    assert_eq!(rig.core.state(), SterilizerState::Stopped);
}

#[test]
fn non_sterile_samples_with_empty_list_only_rearm() {
    let mut rig = Rig::new();
    rig.ready_and_start();

    for _ in 0..20 {
        rig.step(false);
    }
    assert_eq!(rig.core.state(), SterilizerState::Active);
    assert_eq!(rig.core.swings(), 0);
    assert_eq!(rig.core.result_count(), 0);
}

#[test]
fn operator_stop_saves_and_regulator_stops() {
    let mut rig = Rig::new();
    rig.ready_and_start();
    rig.step(true);
    rig.step(true);

    // Stop message and the (small) Saving drain run in one poll pass.
    rig.mailbox.post(SterilizerMsg::Stop).unwrap();
    let collector = spawn_collector(Arc::clone(&rig.file_chan));
    rig.poll();
    let text = String::from_utf8(collector.join().unwrap()).unwrap();

    assert_eq!(rig.core.state(), SterilizerState::Stopped);
    assert_eq!(rig.regulator.try_fetch(), Some(RegulatorMsg::Stop));
    // An operator stop before the list fills is not a success.
    assert!(text.ends_with("Result: FAILURE\n"));
    assert_eq!(rig.core.result_count(), 2);
}

#[test]
fn print_drain_is_byte_identical_to_save_drain() {
    let mut rig = Rig::new();
    rig.ready_and_start();
    for _ in 0..3 {
        rig.step(true);
    }
    rig.mailbox.post(SterilizerMsg::Stop).unwrap();
    let collector = spawn_collector(Arc::clone(&rig.file_chan));
    rig.poll();
    let saved = collector.join().unwrap();
    assert_eq!(rig.core.state(), SterilizerState::Stopped);

    rig.mailbox.post(SterilizerMsg::Print).unwrap();
    let collector = spawn_collector(Arc::clone(&rig.print_chan));
    rig.poll(); // Print message, drain and return to Stopped
    let printed = collector.join().unwrap();

    assert_eq!(saved, printed);
    assert_eq!(rig.core.state(), SterilizerState::Stopped);
}

#[test]
fn storage_open_failure_is_non_fatal_and_keeps_the_list() {
    let mut rig = Rig::new();
    rig.ready_and_start();
    for _ in 0..4 {
        rig.step(true);
    }

    rig.storage.fail_open = true;
    rig.mailbox.post(SterilizerMsg::Stop).unwrap();
    rig.poll();
    assert_eq!(rig.core.state(), SterilizerState::Stopped);
    assert_eq!(rig.core.result_count(), 4);
    assert_eq!(rig.storage.close_requests, 0);
    assert_eq!(rig.file_chan.filled_len(), 0, "nothing was pushed to the writer");

    // The stored list can still be printed afterwards.
    rig.mailbox.post(SterilizerMsg::Print).unwrap();
    let collector = spawn_collector(Arc::clone(&rig.print_chan));
    rig.poll();
    let printed = collector.join().unwrap();
    assert!(String::from_utf8(printed).unwrap().contains("Sterile\n"));
}

#[test]
fn restart_clears_the_previous_run() {
    let mut rig = Rig::new();
    rig.ready_and_start();
    for _ in 0..2 {
        rig.step(true);
    }
    rig.mailbox.post(SterilizerMsg::Stop).unwrap();
    let collector = spawn_collector(Arc::clone(&rig.file_chan));
    rig.poll();
    let _ = collector.join().unwrap();
    assert_eq!(rig.core.result_count(), 2);

    // A new run starts from an empty list and a fresh swing budget.
    rig.set_snapshot(false);
    rig.mailbox.post(SterilizerMsg::Start).unwrap();
    rig.poll();
    assert_eq!(rig.core.state(), SterilizerState::Active);
    assert_eq!(rig.core.result_count(), 0);
    assert_eq!(rig.core.swings(), 0);
    assert!(rig.display.cleared_count() > 0);
    assert_eq!(rig.regulator.try_fetch(), Some(RegulatorMsg::Start));
}
