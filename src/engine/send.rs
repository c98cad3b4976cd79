//! Command send engine.
//!
//! Outbound commands are framed into a byte ring and tracked by a FIFO of
//! descriptors.  Only the head descriptor is ever on the wire; everything
//! behind it waits.
//!
//! ```text
//!            queue non-empty         wait elapsed
//!   ┌──────┐ ─────────────▶ ┌─────────┐ ──────────▶ ┌─────────┐
//!   │ Idle │   raise MFB    │ MfbWait │ first byte  │ Sending │ (TX ISR)
//!   └──────┘                └─────────┘             └────┬────┘
//!      ▲                                     last byte   │
//!      │ queue empty, drop MFB          ┌────────────────┴───┐
//!      │                                ▼ event-ACK          ▼ anything else
//!   ┌──┴──────┐  settle   ┌───────┐ ◀────────── ┌─────────┐
//!   │ AckOk / │ ◀──────── │ AckOk │   ACK ok    │ AckWait │
//!   │AckError │           └───────┘             └────┬────┘
//!   └─────────┘ ◀──────────── ACK error / timeout ────┘
//!        │ more queued: stream next head, MFB stays high
//! ```
//!
//! A failed or unacknowledged command is dropped, never retried.
//!
//! [`SendEngine::poll`] runs from the main loop; [`SendEngine::on_tx_complete`]
//! runs from the UART transmit-complete interrupt.  The two never overlap:
//! the interrupt only advances the byte cursor that `poll` committed when it
//! entered `Sending`, and `poll` does nothing while `Sending`.

use heapless::Deque;
use log::{debug, warn};

use crate::app::ports::{FlowControl, Transport};
use crate::config::BridgeConfig;
use crate::error::SendError;
use crate::protocol::codec::{self, FRAME_OVERHEAD, MAX_PAYLOAD};
use crate::protocol::ids::{AckStatus, command};
use crate::ring::{Fill, RingBuffer};
use crate::timer::Countdown;

/// Descriptor slots.
pub const MAX_PENDING: usize = 20;

/// Outbound byte ring capacity.  Larger than the biggest frame, so a
/// descriptor's start and end offsets never coincide.
pub const TX_BUFFER_SIZE: usize = 512;

const _: () = assert!(TX_BUFFER_SIZE > MAX_PAYLOAD + FRAME_OVERHEAD);

/// Who asked for a command; decides where its outcome is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Telephone/UI layer or the bridge itself.
    Local,
    /// Raw payload relayed on behalf of an external host.
    Forwarded,
    /// Vendor AT command submitted by the AT subsystem.
    AtCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorStatus {
    Queued,
    Sending,
    AwaitingAck,
    Ok,
    NoAck,
    Error(AckStatus),
}

/// Bookkeeping for one queued or in-flight command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Offset of the frame's first byte in the byte ring.
    pub start: usize,
    /// Offset one past the frame's last byte.
    pub end: usize,
    pub command: u8,
    pub origin: Origin,
    pub status: DescriptorStatus,
}

impl Descriptor {
    fn len(&self) -> usize {
        RingBuffer::<u8, TX_BUFFER_SIZE>::span(self.start, self.end)
    }

    fn in_flight(&self) -> bool {
        matches!(
            self.status,
            DescriptorStatus::Sending | DescriptorStatus::AwaitingAck
        )
    }
}

/// Final result of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    /// The module never answered within the ACK timeout.
    NoAck,
    /// The module answered with a failure code.
    Error(AckStatus),
}

impl CommandStatus {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: u8,
    pub origin: Origin,
    pub status: CommandStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    MfbWait,
    Sending,
    AckWait,
    AckOk,
    AckError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    pub ok: u32,
    pub errors: u32,
    pub no_ack: u32,
}

#[derive(Debug, Clone, Copy)]
struct Timings {
    mfb_wait_ms: u32,
    ack_timeout_ms: u32,
    ack_settle_ms: u32,
    event_ack_settle_ms: u32,
}

pub struct SendEngine<'t, T: Transport, F: FlowControl> {
    transport: T,
    mfb: F,
    timer: &'t Countdown,
    timings: Timings,
    state: SendState,
    /// Next ring offset to transmit while `Sending`.
    cursor: usize,
    /// Bytes of the head frame still to transmit while `Sending`.
    remaining: usize,
    queue: Deque<Descriptor, MAX_PENDING>,
    bytes: RingBuffer<u8, TX_BUFFER_SIZE>,
    stats: SendStats,
}

impl<'t, T: Transport, F: FlowControl> SendEngine<'t, T, F> {
    pub fn new(transport: T, mfb: F, timer: &'t Countdown, config: &BridgeConfig) -> Self {
        Self {
            transport,
            mfb,
            timer,
            timings: Timings {
                mfb_wait_ms: config.mfb_wait_ms,
                ack_timeout_ms: config.ack_timeout_ms,
                ack_settle_ms: config.ack_settle_ms,
                event_ack_settle_ms: config.event_ack_settle_ms,
            },
            state: SendState::Idle,
            cursor: 0,
            remaining: 0,
            queue: Deque::new(),
            bytes: RingBuffer::new(),
            stats: SendStats::default(),
        }
    }

    // ── Producer side ─────────────────────────────────────────

    /// Frame `payload` and queue it for transmission.
    ///
    /// Non-blocking: a full descriptor queue or byte ring is reported
    /// immediately and nothing is queued.
    pub fn send(&mut self, payload: &[u8], origin: Origin) -> Result<(), SendError> {
        if payload.is_empty() {
            return Err(SendError::EmptyPayload);
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(SendError::PayloadTooLong);
        }
        if self.queue.is_full() {
            warn!("send: queue full, dropping command 0x{:02X}", payload[0]);
            return Err(SendError::QueueFull);
        }

        let mut frame = [0u8; MAX_PAYLOAD + FRAME_OVERHEAD];
        let n = codec::encode_frame(payload, &mut frame).ok_or(SendError::PayloadTooLong)?;
        let Some(start) = self.bytes.push_slice(&frame[..n]) else {
            warn!("send: buffer full, dropping command 0x{:02X}", payload[0]);
            return Err(SendError::BufferFull);
        };

        let descriptor = Descriptor {
            start,
            end: (start + n) % TX_BUFFER_SIZE,
            command: payload[0],
            origin,
            status: DescriptorStatus::Queued,
        };
        // Cannot fail: fullness was checked above.
        let _ = self.queue.push_back(descriptor);
        debug!(
            "send: queued 0x{:02X} ({} bytes, {} pending)",
            descriptor.command,
            n,
            self.queue.len()
        );
        Ok(())
    }

    // ── Main-loop task ────────────────────────────────────────

    /// Advance the state machine.  Call once per main-loop iteration.
    ///
    /// Returns the outcome of a command whose ACK wait timed out during
    /// this call.  Outcomes from received ACKs come back from
    /// [`ack_received`](Self::ack_received) instead.
    pub fn poll(&mut self) -> Option<CommandOutcome> {
        match self.state {
            SendState::Idle => {
                if !self.queue.is_empty() {
                    self.mfb.assert_wake();
                    self.timer.start(self.timings.mfb_wait_ms);
                    self.state = SendState::MfbWait;
                }
                None
            }
            SendState::MfbWait => {
                if self.timer.is_expired() {
                    self.begin_head();
                }
                None
            }
            SendState::Sending => None,
            SendState::AckWait => {
                if !self.timer.is_expired() {
                    return None;
                }
                let head = self.queue.front_mut()?;
                head.status = DescriptorStatus::NoAck;
                let outcome = CommandOutcome {
                    command: head.command,
                    origin: head.origin,
                    status: CommandStatus::NoAck,
                };
                self.stats.no_ack = self.stats.no_ack.wrapping_add(1);
                warn!("send: no ACK for 0x{:02X}, abandoning", outcome.command);
                self.settle(SendState::AckError, self.timings.ack_settle_ms);
                Some(outcome)
            }
            SendState::AckOk | SendState::AckError => {
                if self.timer.is_expired() {
                    self.finish_head();
                }
                None
            }
        }
    }

    /// An ACK frame arrived for `command`.
    ///
    /// The echoed ID is not checked against the head descriptor: whatever
    /// command is in flight is resolved by the ACK.  A mismatch is logged.
    pub fn ack_received(&mut self, command: u8, status: AckStatus) -> Option<CommandOutcome> {
        if self.state != SendState::AckWait {
            debug!("send: stray ACK for 0x{:02X} in {:?}", command, self.state);
            return None;
        }
        let head = self.queue.front_mut()?;
        if head.command != command {
            warn!(
                "send: ACK echoes 0x{:02X} but head is 0x{:02X}; accepting",
                command, head.command
            );
        }

        let outcome = CommandOutcome {
            command: head.command,
            origin: head.origin,
            status: if status.is_ok() {
                CommandStatus::Ok
            } else {
                CommandStatus::Error(status)
            },
        };

        if status.is_ok() {
            head.status = DescriptorStatus::Ok;
            self.stats.ok = self.stats.ok.wrapping_add(1);
            self.settle(SendState::AckOk, self.timings.ack_settle_ms);
        } else {
            head.status = DescriptorStatus::Error(status);
            self.stats.errors = self.stats.errors.wrapping_add(1);
            warn!("send: 0x{:02X} rejected: {:?}", outcome.command, status);
            self.settle(SendState::AckError, self.timings.ack_settle_ms);
        }
        Some(outcome)
    }

    // ── Transmit-complete interrupt ───────────────────────────

    /// The UART finished shifting out the previous byte.
    pub fn on_tx_complete(&mut self) {
        if self.state != SendState::Sending {
            return;
        }
        if self.remaining == 0 {
            self.finish_transmission();
            return;
        }
        let byte = self.bytes.at(self.cursor);
        self.cursor = (self.cursor + 1) % TX_BUFFER_SIZE;
        self.remaining -= 1;
        self.write_byte(byte);
    }

    /// Stream the rest of the head frame at once, for UART drivers that
    /// buffer writes instead of raising a per-byte interrupt.
    pub fn pump_tx(&mut self) {
        while self.state == SendState::Sending {
            self.on_tx_complete();
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn begin_head(&mut self) {
        let Some(head) = self.queue.front_mut() else {
            self.go_idle();
            return;
        };
        head.status = DescriptorStatus::Sending;
        let (start, len) = (head.start, head.len());

        self.cursor = (start + 1) % TX_BUFFER_SIZE;
        self.remaining = len.saturating_sub(1);
        self.state = SendState::Sending;
        self.write_byte(self.bytes.at(start));
    }

    fn finish_transmission(&mut self) {
        let Some(head) = self.queue.front_mut() else {
            self.go_idle();
            return;
        };
        if head.command == command::EVENT_ACK {
            // The module never ACKs an event-ACK.
            head.status = DescriptorStatus::Ok;
            self.settle(SendState::AckOk, self.timings.event_ack_settle_ms);
        } else {
            head.status = DescriptorStatus::AwaitingAck;
            self.settle(SendState::AckWait, self.timings.ack_timeout_ms);
        }
    }

    /// Free the head descriptor and its bytes, then move on.
    fn finish_head(&mut self) {
        if let Some(head) = self.queue.pop_front() {
            self.bytes.release(head.len());
        }
        if self.queue.is_empty() {
            self.go_idle();
        } else {
            self.begin_head();
        }
    }

    fn settle(&mut self, next: SendState, ms: u32) {
        self.state = next;
        self.timer.start(ms);
    }

    fn go_idle(&mut self) {
        self.mfb.release();
        self.state = SendState::Idle;
    }

    fn write_byte(&mut self, byte: u8) {
        if let Err(e) = self.transport.write(&[byte]) {
            warn!("send: UART write failed: {:?}", e);
        }
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn state(&self) -> SendState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SendState::Idle && self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.queue.iter()
    }

    /// Descriptors currently `Sending` or `AwaitingAck` (never more than one).
    pub fn in_flight(&self) -> usize {
        self.queue.iter().filter(|d| d.in_flight()).count()
    }

    pub fn buffer_fill(&self) -> Fill {
        self.bytes.fill()
    }

    pub fn stats(&self) -> SendStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Drop everything queued and release MFB (e.g. after a module reset).
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.queue.clear();
        self.bytes.clear();
        self.remaining = 0;
        self.go_idle();
    }
}
