//! Fuzz target: `Bridge::receive`
//!
//! Feeds arbitrary module output into a complete bridge, interleaved with
//! timer ticks, and checks the send engine never has more than one
//! command in flight.
//!
//! cargo fuzz run fuzz_bridge_rx

#![no_main]

use carphone::app::ports::{FlowControl, TelephonyHandler, Transport};
use carphone::bridge::Bridge;
use carphone::config::BridgeConfig;
use carphone::protocol::events::Notification;
use carphone::timer::BridgeTimers;
use libfuzzer_sys::fuzz_target;

struct Sink;

impl Transport for Sink {
    type Error = ();
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }
    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }
    fn available(&self) -> bool {
        false
    }
}

struct Line;

impl FlowControl for Line {
    fn assert_wake(&mut self) {}
    fn release(&mut self) {}
}

struct Quiet;

impl TelephonyHandler for Quiet {
    fn on_notification(&mut self, _n: &Notification<'_>) {}
}

fuzz_target!(|data: &[u8]| {
    let timers = BridgeTimers::new();
    let Ok(mut bridge) = Bridge::new(&BridgeConfig::default(), &timers, Sink, Line, Quiet) else {
        return;
    };
    let _ = bridge.at_send("+CLCC", None);

    for chunk in data.chunks(7) {
        bridge.receive(chunk);
        bridge.poll();
        bridge.pump_tx();
        timers.tick();
        assert!(bridge.send_engine().in_flight() <= 1);
    }
});
