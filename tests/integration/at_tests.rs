//! AT command scenarios: one command in flight, prefix correlation, the
//! three failure paths and a send queue stalled by unanswered commands.

use carphone::at::AtStatus;
use carphone::config::BridgeConfig;
use carphone::error::{AtError, Error};
use carphone::protocol::ids::{command, event};
use carphone::timer::BridgeTimers;

use crate::mock_hw::*;

fn at_frame(text: &str) -> Vec<u8> {
    let mut p = vec![command::VENDOR_AT_CMD, 0x00];
    p.extend_from_slice(text.as_bytes());
    p
}

fn result_line(text: &str) -> Vec<u8> {
    let mut p = vec![event::UNKNOWN_AT_RESULT, 0x00];
    p.extend_from_slice(text.as_bytes());
    p.extend_from_slice(b"\r\n");
    p
}

#[test]
fn clcc_result_reaches_callback() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);
    b.set_unsolicited_handler(record_unsolicited);

    b.at_send("+CLCC", Some(record_at)).unwrap();
    run_ms(&mut b, &timers, 6);
    assert_eq!(take_sent(&wire), vec![at_frame("+CLCC")]);

    let line = "+CLCC: 1,0,4,0,0,\"5551234567\",129";
    inject(&wire, &[event::ACK, command::VENDOR_AT_CMD, 0x00]);
    inject(&wire, &result_line(line));
    inject(&wire, &result_line("+CIEV: 1,1"));
    inject(&wire, &[event::VENDOR_AT_CMD_RSP, 0x00, 0x00]);
    run_ms(&mut b, &timers, 50);

    let phone = b.handler();
    assert_eq!(
        phone.at,
        vec![
            (AtStatus::Result, Some(line.to_string())),
            (AtStatus::Ok, None),
        ]
    );
    assert_eq!(phone.unsolicited, vec!["+CIEV: 1,1"]);
    assert!(!b.at().is_busy());

    // Three non-ACK events, three event-ACKs.
    assert_eq!(
        take_sent(&wire),
        vec![
            vec![command::EVENT_ACK, event::UNKNOWN_AT_RESULT],
            vec![command::EVENT_ACK, event::UNKNOWN_AT_RESULT],
            vec![command::EVENT_ACK, event::VENDOR_AT_CMD_RSP],
        ]
    );
}

#[test]
fn second_command_waits_for_first_to_finish() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.at_send("+CSQ", Some(record_at)).unwrap();
    b.at_send("+CBC", Some(record_at)).unwrap();
    run_ms(&mut b, &timers, 6);
    assert_eq!(take_sent(&wire), vec![at_frame("+CSQ")]);

    inject(&wire, &[event::ACK, command::VENDOR_AT_CMD, 0x00]);
    run_ms(&mut b, &timers, 100);
    assert!(take_sent(&wire).is_empty());
    assert_eq!(b.at().queued(), 2);

    inject(&wire, &[event::VENDOR_AT_CMD_RSP, 0x00, 0x01]);
    run_ms(&mut b, &timers, 50);

    assert_eq!(
        take_sent(&wire),
        vec![
            vec![command::EVENT_ACK, event::VENDOR_AT_CMD_RSP],
            at_frame("+CBC"),
        ]
    );
    assert_eq!(b.handler().at, vec![(AtStatus::Error, None)]);
    assert_eq!(b.at().queued(), 1);
}

#[test]
fn dtmf_digit_is_sent_as_vts() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.at_send_dtmf('#', None).unwrap();
    run_ms(&mut b, &timers, 6);

    assert_eq!(take_sent(&wire), vec![at_frame("+VTS=#")]);
    assert_eq!(
        b.at_send_dtmf('x', None),
        Err(Error::At(AtError::InvalidDigit))
    );
}

#[test]
fn frame_rejection_fails_pending_command() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);

    b.at_send("+CLCC", Some(record_at)).unwrap();
    run_ms(&mut b, &timers, 6);
    inject(&wire, &[event::ACK, command::VENDOR_AT_CMD, 0x03]);
    run_ms(&mut b, &timers, 1);

    assert_eq!(b.handler().at, vec![(AtStatus::Failed, None)]);
    assert!(b.handler().outcomes.is_empty());
    assert!(b.handler().failed.is_empty());
    assert_eq!(b.at().queued(), 0);
}

#[test]
fn missing_frame_ack_fails_pending_command() {
    let timers = BridgeTimers::new();
    let (mut b, _wire) = bridge(&timers);

    b.at_send("+CLCC", Some(record_at)).unwrap();
    run_ms(&mut b, &timers, 1100);

    assert_eq!(b.handler().at, vec![(AtStatus::Failed, None)]);
    assert!(!b.at().is_busy());
}

#[test]
fn silent_phone_times_out_with_no_response() {
    let timers = BridgeTimers::new();
    let cfg = BridgeConfig {
        at_response_timeout_ms: 1500,
        ..Default::default()
    };
    let (mut b, wire) = bridge_with(&timers, &cfg);

    b.at_send("+CSQ", Some(record_at)).unwrap();
    run_ms(&mut b, &timers, 6);
    inject(&wire, &[event::ACK, command::VENDOR_AT_CMD, 0x00]);
    run_ms(&mut b, &timers, 1000);
    assert!(b.handler().at.is_empty());

    run_ms(&mut b, &timers, 600);
    assert_eq!(b.handler().at, vec![(AtStatus::NoResponse, None)]);
}

fn vendor_at_queued(b: &TestBridge<'_>) -> usize {
    b.send_engine()
        .descriptors()
        .filter(|d| d.command == command::VENDOR_AT_CMD)
        .count()
}

#[test]
fn response_timer_waits_for_stalled_send_queue() {
    let timers = BridgeTimers::new();
    let (mut b, _wire) = bridge(&timers);

    // Six commands the module never ACKs hold the queue for about 6.1 s,
    // longer than the 5 s AT response timeout.
    for _ in 0..6 {
        b.read_link_status().unwrap();
    }
    b.at_send("+CSQ", Some(record_at)).unwrap();
    b.at_send("+CBC", Some(record_at)).unwrap();

    run_ms(&mut b, &timers, 5100);
    assert!(b.handler().at.is_empty());
    assert_eq!(vendor_at_queued(&b), 1);
    assert_eq!(b.at().queued(), 2);

    // +CSQ finally goes out, is never ACKed and fails on its own; only then
    // is +CBC submitted.
    run_ms(&mut b, &timers, 2200);
    assert_eq!(b.handler().at, vec![(AtStatus::Failed, None)]);
    assert_eq!(vendor_at_queued(&b), 1);
    assert_eq!(b.at().queued(), 1);
    assert!(b.at().is_busy());
}

#[test]
fn late_response_does_not_complete_next_command() {
    let timers = BridgeTimers::new();
    let cfg = BridgeConfig {
        at_response_timeout_ms: 1500,
        ..Default::default()
    };
    let (mut b, wire) = bridge_with(&timers, &cfg);

    b.at_send("+CSQ", Some(record_at)).unwrap();
    b.at_send("+CBC", Some(record_at)).unwrap();
    run_ms(&mut b, &timers, 6);
    inject(&wire, &[event::ACK, command::VENDOR_AT_CMD, 0x00]);
    run_ms(&mut b, &timers, 1600);
    assert_eq!(b.handler().at, vec![(AtStatus::NoResponse, None)]);

    let sent = take_sent(&wire);
    assert_eq!(sent.last(), Some(&at_frame("+CBC")));

    // +CSQ's answer shows up while +CBC still waits for its frame ACK.
    inject(&wire, &[event::VENDOR_AT_CMD_RSP, 0x00, 0x00]);
    run_ms(&mut b, &timers, 5);
    assert_eq!(b.handler().at, vec![(AtStatus::NoResponse, None)]);
    assert!(b.at().is_busy());

    inject(&wire, &[event::ACK, command::VENDOR_AT_CMD, 0x00]);
    run_ms(&mut b, &timers, 30);
    inject(&wire, &[event::VENDOR_AT_CMD_RSP, 0x00, 0x01]);
    run_ms(&mut b, &timers, 5);

    assert_eq!(
        b.handler().at,
        vec![(AtStatus::NoResponse, None), (AtStatus::Error, None)]
    );
    assert_eq!(b.at().queued(), 0);
}

#[test]
fn result_with_nothing_pending_is_unsolicited() {
    let timers = BridgeTimers::new();
    let (mut b, wire) = bridge(&timers);
    b.set_unsolicited_handler(record_unsolicited);

    inject(&wire, &result_line("RING"));
    run_ms(&mut b, &timers, 1);

    assert_eq!(b.handler().unsolicited, vec!["RING"]);
}

#[test]
fn over_long_text_is_refused() {
    let timers = BridgeTimers::new();
    let (mut b, _wire) = bridge(&timers);

    let text = format!("+CMGS={}", "9".repeat(64));
    assert_eq!(b.at_send(&text, None), Err(Error::At(AtError::TooLong)));
}
