//! Bridge scenarios: framing, event acknowledgement, command flow control
//! and failure routing, driven through the mock UART.

use carphone::bridge::Bridge;
use carphone::config::BridgeConfig;
use carphone::engine::send::{CommandStatus, Origin, SendState};
use carphone::error::{CommandError, Error, SendError};
use carphone::protocol::events::CallState;
use carphone::protocol::ids::{AckStatus, command, event, mmi};
use carphone::timer::BridgeTimers;

use crate::mock_hw::*;

#[test]
fn invalid_config_is_rejected() {
    let timers = BridgeTimers::new();
    let wire = SharedWire::default();
    let cfg = BridgeConfig {
        mfb_wait_ms: 0,
        ..Default::default()
    };
    let result = Bridge::new(
        &cfg,
        &timers,
        MockUart(wire.clone()),
        carphone::adapters::mfb::MfbPin::new(MockMfbPin(wire)),
        RecordingPhone::default(),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn notification_is_delivered_and_acknowledged() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    inject(&wire, &[event::CALL_STATUS, 0x00, 0x02]);
    run_ms(&mut b, &timers, 10);

    assert_eq!(b.handler().seen, vec![Seen::Call(CallState::Incoming)]);
    assert_eq!(take_sent(&wire), vec![vec![command::EVENT_ACK, event::CALL_STATUS]]);
    assert!(b.send_engine().is_idle());
    assert!(!wire.borrow().mfb);
}

#[test]
fn line_noise_and_bad_checksum_are_dropped() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    let mut corrupt = frame(&[event::CALLER_ID, 0x00, b'1', b'2']);
    *corrupt.last_mut().unwrap() ^= 0x01;
    {
        let mut w = wire.borrow_mut();
        w.rx.extend([0x13, 0xAA, 0x55, 0x00]);
        w.rx.extend(corrupt);
    }
    inject(&wire, b"\x03\x005551234567");
    run_ms(&mut b, &timers, 1);

    assert_eq!(b.handler().seen, vec![Seen::CallerId("5551234567".into())]);
    assert_eq!(b.stats().dropped_frames, 1);
    assert_eq!(b.stats().dispatch.frames, 1);
}

#[test]
fn spp_data_is_not_acknowledged() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    inject(&wire, &[event::REPORT_SPP_DATA, 0x00, 0x41]);
    run_ms(&mut b, &timers, 10);

    assert_eq!(b.handler().seen.len(), 1);
    assert!(take_sent(&wire).is_empty());
    assert_eq!(wire.borrow().mfb_rises, 0);
}

#[test]
fn command_waits_for_mfb_then_for_ack() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.accept_call().unwrap();
    run_ms(&mut b, &timers, 1);
    assert!(wire.borrow().mfb);
    assert!(wire.borrow().tx.is_empty());

    run_ms(&mut b, &timers, 4);
    assert_eq!(
        take_sent(&wire),
        vec![vec![command::MMI_ACTION, 0x00, mmi::ACCEPT_CALL]]
    );
    assert_eq!(b.send_engine().state(), SendState::AckWait);

    inject(&wire, &[event::ACK, command::MMI_ACTION, 0x00]);
    run_ms(&mut b, &timers, 25);

    assert_eq!(b.handler().outcomes.len(), 1);
    assert_eq!(b.handler().outcomes[0].status, CommandStatus::Ok);
    assert_eq!(b.handler().outcomes[0].origin, Origin::Local);
    assert!(b.send_engine().is_idle());
    assert!(!wire.borrow().mfb);
    // The ACK itself is never acknowledged.
    assert!(take_sent(&wire).is_empty());
}

#[test]
fn commands_are_strictly_fifo() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.accept_call().unwrap();
    b.end_call().unwrap();
    run_ms(&mut b, &timers, 100);
    assert_eq!(take_sent(&wire).len(), 1);
    assert_eq!(b.send_engine().in_flight(), 1);

    inject(&wire, &[event::ACK, command::MMI_ACTION, 0x00]);
    run_ms(&mut b, &timers, 25);

    assert_eq!(
        take_sent(&wire),
        vec![vec![command::MMI_ACTION, 0x00, mmi::END_CALL]]
    );
    // MFB stayed high between the two commands.
    assert_eq!(wire.borrow().mfb_rises, 1);
}

#[test]
fn missing_ack_abandons_command_and_moves_on() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.accept_call().unwrap();
    b.end_call().unwrap();
    run_ms(&mut b, &timers, 5);
    run_ms(&mut b, &timers, 1100);

    let phone = b.handler();
    assert_eq!(phone.outcomes[0].status, CommandStatus::NoAck);
    assert_eq!(phone.failed, vec![command::MMI_ACTION]);
    assert_eq!(phone.warnings, 1);

    let sent = take_sent(&wire);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], vec![command::MMI_ACTION, 0x00, mmi::END_CALL]);
    assert_eq!(b.send_engine().pending(), 1);
    assert_eq!(b.stats().send.no_ack, 1);
}

#[test]
fn twenty_first_command_is_refused_until_head_completes() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    for _ in 0..20 {
        b.accept_call().unwrap();
    }
    assert_eq!(b.end_call(), Err(Error::Send(SendError::QueueFull)));
    assert_eq!(b.send_engine().pending(), 20);
    assert!(
        b.send_engine()
            .descriptors()
            .all(|d| d.command == command::MMI_ACTION)
    );

    run_ms(&mut b, &timers, 5);
    inject(&wire, &[event::ACK, command::MMI_ACTION, 0x00]);
    run_ms(&mut b, &timers, 25);

    assert_eq!(b.send_engine().pending(), 19);
    assert!(b.end_call().is_ok());
}

#[test]
fn mismatched_ack_resolves_head_anyway() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.accept_call().unwrap();
    run_ms(&mut b, &timers, 5);
    inject(&wire, &[event::ACK, command::DISCONNECT, 0x00]);
    run_ms(&mut b, &timers, 1);

    let outcome = b.handler().outcomes[0];
    assert_eq!(outcome.command, command::MMI_ACTION);
    assert_eq!(outcome.status, CommandStatus::Ok);
}

#[test]
fn rejected_make_call_raises_call_failed() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.make_call("5551234").unwrap();
    run_ms(&mut b, &timers, 5);
    assert_eq!(take_sent(&wire), vec![b"\x00\x005551234".to_vec()]);

    inject(&wire, &[event::ACK, command::MAKE_CALL, 0x01]);
    run_ms(&mut b, &timers, 1);

    let phone = b.handler();
    assert_eq!(phone.seen, vec![Seen::CallFailed]);
    assert!(phone.failed.is_empty());
    assert_eq!(
        phone.outcomes[0].status,
        CommandStatus::Error(AckStatus::Disallowed)
    );
}

#[test]
fn rejected_mmi_flashes_warning() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.enter_pairing().unwrap();
    run_ms(&mut b, &timers, 5);
    inject(&wire, &[event::ACK, command::MMI_ACTION, 0x04]);
    run_ms(&mut b, &timers, 1);

    assert_eq!(b.handler().failed, vec![command::MMI_ACTION]);
    assert_eq!(b.handler().warnings, 1);
    assert_eq!(b.stats().send.errors, 1);
}

#[test]
fn invalid_dial_string_is_refused_synchronously() {
    let timers = BridgeTimers::new();
    let (mut b, _wire) = bridge(&timers);

    assert_eq!(
        b.make_call("555-1234"),
        Err(Error::Command(CommandError::InvalidDigits))
    );
    assert_eq!(b.make_call(""), Err(Error::Command(CommandError::InvalidDigits)));
    assert_eq!(b.send_engine().pending(), 0);
}

#[test]
fn forwarded_outcome_stays_out_of_the_handler() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.forward(&[command::READ_BTM_VERSION, 0x00]).unwrap();
    run_ms(&mut b, &timers, 5);
    inject(&wire, &[event::ACK, command::READ_BTM_VERSION, 0x02]);
    run_ms(&mut b, &timers, 1);

    assert!(b.handler().outcomes.is_empty());
    assert!(b.handler().failed.is_empty());
    assert_eq!(b.stats().send.errors, 1);
}

#[test]
fn power_on_sends_press_then_release() {
    let timers = BridgeTimers::new();
    let (mut b, _wire) = bridge(&timers);

    b.power_on().unwrap();
    let actions: Vec<u8> = b.send_engine().descriptors().map(|d| d.command).collect();
    assert_eq!(actions, vec![command::MMI_ACTION, command::MMI_ACTION]);
}

#[test]
fn device_name_and_reads_encode() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.set_device_name("Fone").unwrap();
    run_ms(&mut b, &timers, 5);
    assert_eq!(
        take_sent(&wire),
        vec![vec![command::CHANGE_DEVICE_NAME, 0x00, 4, b'F', b'o', b'n', b'e']]
    );

    let long = "N".repeat(33);
    assert_eq!(
        b.set_device_name(&long),
        Err(Error::Command(CommandError::NameTooLong))
    );
}

#[test]
fn local_address_reply_is_parsed() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    inject(
        &wire,
        &[event::LOCAL_BD_ADDRESS_REPLY, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06],
    );
    run_ms(&mut b, &timers, 1);

    assert_eq!(
        b.handler().seen,
        vec![Seen::Other("LocalAddress([1, 2, 3, 4, 5, 6])".into())]
    );
}

#[test]
fn stray_ack_while_idle_is_ignored() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    inject(&wire, &[event::ACK, command::MMI_ACTION, 0x00]);
    run_ms(&mut b, &timers, 5);

    assert!(b.handler().outcomes.is_empty());
    assert!(b.send_engine().is_idle());
}

#[test]
fn reset_drops_queued_work() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.accept_call().unwrap();
    b.at_send("+CLCC", None).unwrap();
    run_ms(&mut b, &timers, 5);
    assert!(wire.borrow().mfb);

    b.reset();

    assert_eq!(b.send_engine().pending(), 0);
    assert_eq!(b.at().queued(), 0);
    assert!(!wire.borrow().mfb);
}
