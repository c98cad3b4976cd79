//! Mock hardware for integration tests.
//!
//! `MockUart` and `MockMfbPin` share one [`Wire`] so tests can inject
//! module frames and assert on everything the bridge wrote, including MFB
//! edges, without touching real peripherals.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use carphone::adapters::mfb::MfbPin;
use carphone::app::ports::{TelephonyHandler, Transport};
use carphone::at::{AtResponse, AtStatus};
use carphone::bridge::Bridge;
use carphone::config::BridgeConfig;
use carphone::engine::send::CommandOutcome;
use carphone::protocol::codec::{FRAME_OVERHEAD, FrameDecoder, MAX_PAYLOAD, encode_frame};
use carphone::protocol::events::Notification;
use carphone::timer::BridgeTimers;
use embedded_hal::digital::{ErrorType, OutputPin};

// ── Shared wire state ─────────────────────────────────────────

#[derive(Default)]
pub struct Wire {
    /// Bytes the module will send us.
    pub rx: VecDeque<u8>,
    /// Bytes we sent the module.
    pub tx: Vec<u8>,
    pub mfb: bool,
    pub mfb_rises: u32,
}

pub type SharedWire = Rc<RefCell<Wire>>;

pub struct MockUart(pub SharedWire);

impl Transport for MockUart {
    type Error = Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut w = self.0.borrow_mut();
        let n = buf.len().min(w.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = w.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        self.0.borrow_mut().tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn available(&self) -> bool {
        !self.0.borrow().rx.is_empty()
    }
}

pub struct MockMfbPin(pub SharedWire);

impl ErrorType for MockMfbPin {
    type Error = Infallible;
}

impl OutputPin for MockMfbPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().mfb = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut w = self.0.borrow_mut();
        if !w.mfb {
            w.mfb_rises += 1;
        }
        w.mfb = true;
        Ok(())
    }
}

// ── Recording handler ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Call(carphone::protocol::events::CallState),
    CallerId(String),
    CallFailed,
    Other(String),
}

#[derive(Default)]
pub struct RecordingPhone {
    pub seen: Vec<Seen>,
    pub outcomes: Vec<CommandOutcome>,
    pub failed: Vec<u8>,
    pub warnings: u32,
    pub at: Vec<(AtStatus, Option<String>)>,
    pub unsolicited: Vec<String>,
}

impl TelephonyHandler for RecordingPhone {
    fn on_notification(&mut self, n: &Notification<'_>) {
        self.seen.push(match n {
            Notification::CallStatus { state, .. } => Seen::Call(*state),
            Notification::CallerId { number, .. } => Seen::CallerId((*number).to_string()),
            Notification::CallFailed { .. } => Seen::CallFailed,
            other => Seen::Other(format!("{:?}", other)),
        });
    }

    fn on_command_outcome(&mut self, outcome: &CommandOutcome) {
        self.outcomes.push(*outcome);
    }

    fn on_command_failed(&mut self, outcome: &CommandOutcome) {
        self.failed.push(outcome.command);
        self.flash_warning();
    }

    fn flash_warning(&mut self) {
        self.warnings += 1;
    }
}

/// AT callback recording every response.
pub fn record_at(phone: &mut RecordingPhone, rsp: AtResponse<'_>) {
    phone.at.push((rsp.status, rsp.line.map(str::to_string)));
}

/// Unsolicited handler recording the line.
pub fn record_unsolicited(phone: &mut RecordingPhone, line: &str) {
    phone.unsolicited.push(line.to_string());
}

// ── Bridge fixture ────────────────────────────────────────────

pub type TestBridge<'t> = Bridge<'t, RecordingPhone, MockUart, MfbPin<MockMfbPin>>;

pub fn bridge(timers: &BridgeTimers) -> (TestBridge<'_>, SharedWire) {
    bridge_with(timers, &BridgeConfig::default())
}

pub fn bridge_with<'t>(
    timers: &'t BridgeTimers,
    config: &BridgeConfig,
) -> (TestBridge<'t>, SharedWire) {
    let wire = SharedWire::default();
    let b = Bridge::new(
        config,
        timers,
        MockUart(wire.clone()),
        MfbPin::new(MockMfbPin(wire.clone())),
        RecordingPhone::default(),
    )
    .expect("default config is valid");
    (b, wire)
}

/// Run the bridge main loop for `ms` milliseconds of ticks.
pub fn run_ms(b: &mut TestBridge<'_>, timers: &BridgeTimers, ms: u32) {
    for _ in 0..ms {
        b.poll();
        b.pump_tx();
        timers.tick();
    }
    b.poll();
    b.pump_tx();
}

/// Frame `payload` the way the module would and queue it for reception.
pub fn inject(wire: &SharedWire, payload: &[u8]) {
    wire.borrow_mut().rx.extend(frame(payload));
}

pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = [0u8; MAX_PAYLOAD + FRAME_OVERHEAD];
    let n = encode_frame(payload, &mut buf).expect("payload fits a frame");
    buf[..n].to_vec()
}

/// Decode every frame written so far and clear the capture.
pub fn take_sent(wire: &SharedWire) -> Vec<Vec<u8>> {
    let bytes = std::mem::take(&mut wire.borrow_mut().tx);
    let mut dec = FrameDecoder::new();
    bytes
        .into_iter()
        .filter_map(|b| dec.push(b).map(<[u8]>::to_vec))
        .collect()
}
