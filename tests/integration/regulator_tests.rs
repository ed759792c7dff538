//! End-to-end regulator behaviour: acquisition FIFO in, duty cycles and
//! display/fault notifications out.

use std::sync::Arc;

use waxsteril::app::events::DisplayEvent;
use waxsteril::buffer::LineChannel;
use waxsteril::config::{CHANNEL_COUNT, SystemConfig};
use waxsteril::error::FaultCode;
use waxsteril::regulator::{RegulatorCore, RegulatorMailbox, RegulatorMsg, RegulatorState};
use waxsteril::sensors::TempFifo;

use crate::mock_hw::{FixedClock, HeaterCall, MockHeaters, MockStorage, RecordingDisplay, RecordingFaults};

struct Rig {
    core: RegulatorCore,
    mailbox: Arc<RegulatorMailbox>,
    fifo: Arc<TempFifo>,
    log_chan: Arc<LineChannel>,
    clock: FixedClock,
    heaters: MockHeaters,
    storage: MockStorage,
    display: RecordingDisplay,
    faults: RecordingFaults,
}

impl Rig {
    fn new() -> Self {
        let mailbox = Arc::new(RegulatorMailbox::new());
        let fifo = Arc::new(TempFifo::new());
        let log_chan = Arc::new(LineChannel::new());
        let core = RegulatorCore::new(
            SystemConfig::default(),
            Arc::clone(&mailbox),
            Arc::clone(&fifo),
            Arc::clone(&log_chan),
        );
        Self {
            core,
            mailbox,
            fifo,
            log_chan,
            clock: FixedClock::new(),
            heaters: MockHeaters::default(),
            storage: MockStorage::default(),
            display: RecordingDisplay::default(),
            faults: RecordingFaults::default(),
        }
    }

    fn poll(&mut self) {
        self.core.poll(
            &self.clock,
            &mut self.heaters,
            &mut self.storage,
            &mut self.display,
            &mut self.faults,
        );
    }

    fn feed_sample(&mut self, temp: [i16; CHANNEL_COUNT], dtemp: [i16; CHANNEL_COUNT], ts: u32) {
        let mut item = self.fifo.acquire_empty().expect("temp FIFO has room");
        item.temp = temp;
        item.dtemp = dtemp;
        item.timestamp_ms = ts;
        item.sterile = false;
        self.fifo.submit_filled(item).expect("temp FIFO accepts");
    }
}

#[test]
fn cold_load_is_driven_at_full_power() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.poll();

    // 70 degC, holding steady: deep in the cold band.
    rig.feed_sample([8960; CHANNEL_COUNT], [0; CHANNEL_COUNT], 1_000);
    rig.poll();

    assert_eq!(rig.core.state(), RegulatorState::Active);
    assert_eq!(rig.heaters.duty, [100; CHANNEL_COUNT]);
    assert!(rig.faults.codes.is_empty());
    assert!(
        rig.display
            .events
            .iter()
            .any(|e| matches!(e, DisplayEvent::HeatPower(d) if *d == [100; CHANNEL_COUNT]))
    );
}

#[test]
fn sterile_band_holds_with_small_duty() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.poll();

    // 114.5 degC, steady: sterile/zero fires small duty alone; the hot
    // band pulls the weighted average further down.
    rig.feed_sample([14_656; CHANNEL_COUNT], [0; CHANNEL_COUNT], 1_000);
    rig.poll();

    let duty = rig.core.duty()[0];
    assert!(duty < 25, "sterile hold duty was {duty}");
}

#[test]
fn disable_preempts_queued_start() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.mailbox.post_ahead(RegulatorMsg::Disable).unwrap();

    // First poll consumes Disable; the queued Start is then ignored
    // because Disabled is terminal.
    rig.poll();
    assert_eq!(rig.core.state(), RegulatorState::Disabled);
    rig.poll();
    assert_eq!(rig.core.state(), RegulatorState::Disabled);
    assert!(rig.heaters.calls.contains(&HeaterCall::Disable));
    assert!(!rig.heaters.enabled);
}

#[test]
fn stop_zeroes_duty_and_notifies_display() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.poll();
    rig.feed_sample([8960; CHANNEL_COUNT], [0; CHANNEL_COUNT], 1_000);
    rig.poll();
    assert_eq!(rig.heaters.duty, [100; CHANNEL_COUNT]);

    rig.mailbox.post(RegulatorMsg::Stop).unwrap();
    rig.poll();
    assert_eq!(rig.core.state(), RegulatorState::Stopped);
    assert_eq!(rig.heaters.duty, [0; CHANNEL_COUNT]);
    assert_eq!(rig.storage.close_requests, 1);
    assert!(
        rig.display
            .events
            .iter()
            .any(|e| matches!(e, DisplayEvent::RegulatorState(RegulatorState::Stopped)))
    );
}

#[test]
fn critical_ceiling_faults_every_affected_channel() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.poll();

    rig.feed_sample([16_000, 9000, 16_128], [0; CHANNEL_COUNT], 1_000);
    rig.poll();
    let criticals = rig
        .faults
        .codes
        .iter()
        .filter(|c| **c == FaultCode::CriticalTemp)
        .count();
    assert_eq!(criticals, 2);
}

#[test]
fn runaway_heating_rate_raises_critical_rate() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.poll();

    rig.feed_sample([9000; CHANNEL_COUNT], [0; CHANNEL_COUNT], 10_000);
    rig.poll();
    assert!(rig.faults.codes.is_empty());

    // 2 degC in 10 s on every channel: 0.2 degC/s, twice the limit.
    rig.feed_sample([9256; CHANNEL_COUNT], [4; CHANNEL_COUNT], 20_000);
    rig.poll();
    assert!(rig.faults.codes.contains(&FaultCode::CriticalRate));
}

#[test]
fn cycle_log_flows_into_the_log_channel() {
    let mut rig = Rig::new();
    rig.mailbox.post(RegulatorMsg::Start).unwrap();
    rig.poll();
    rig.feed_sample([9600; CHANNEL_COUNT], [1; CHANNEL_COUNT], 1_000);
    rig.poll();

    assert_eq!(rig.storage.opens.len(), 1);
    assert!(rig.storage.opens[0].starts_with("/logs/log2024_03_09_"));
    let line = rig.log_chan.take_filled().expect("one log line per cycle");
    assert!(line.starts_with("0 75.000 75.000 75.000"));
}

#[test]
fn snapshot_feeds_downstream_readers() {
    let mut rig = Rig::new();
    let snapshot = rig.core.snapshot();
    rig.feed_sample([10_000; CHANNEL_COUNT], [2; CHANNEL_COUNT], 5_000);
    rig.poll();

    let copy = *snapshot.lock().unwrap();
    assert_eq!(copy.temp, [10_000; CHANNEL_COUNT]);
    assert_eq!(copy.dtemp, [2; CHANNEL_COUNT]);
    assert_eq!(copy.timestamp_ms, 5_000);

    // The FIFO item went back to the free queue after consumption.
    assert_eq!(rig.fifo.free_len(), rig.fifo.capacity());
}
