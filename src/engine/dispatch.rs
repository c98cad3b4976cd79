//! Event dispatcher.
//!
//! Routes each decoded payload to the component that owns it:
//!
//! ```text
//!   payload ──▶ parse ──┬─ Ack ─────────▶ SendEngine::ack_received ──▶ route_outcome
//!                       ├─ AtResult ────▶ AtSubsystem::on_result_line
//!                       ├─ AtResponse ──▶ AtSubsystem::on_response
//!                       └─ Notify ──────▶ TelephonyHandler::on_notification
//! ```
//!
//! Every non-ACK event except SPP passthrough data is acknowledged with an
//! event-ACK command, queued before the event is handed on.

use log::{debug, info, warn};

use crate::app::ports::{FlowControl, TelephonyHandler, Transport};
use crate::at::AtSubsystem;
use crate::engine::send::{CommandOutcome, Origin, SendEngine};
use crate::error::CommandError;
use crate::protocol::commands::Command;
use crate::protocol::events::{self, Inbound, Notification};
use crate::protocol::ids::{command, event};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub frames: u32,
    pub acks: u32,
    pub notifications: u32,
    /// Events with an ID (or shape) this firmware does not interpret.
    pub unknown: u32,
    /// Event-ACKs that could not be queued.
    pub event_ack_failures: u32,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one decoded payload.  Must complete before the decoder is fed
    /// again, since `payload` borrows its buffer.
    pub fn dispatch<H, T, F>(
        &mut self,
        payload: &[u8],
        send: &mut SendEngine<'_, T, F>,
        at: &mut AtSubsystem<'_, H>,
        handler: &mut H,
    ) where
        H: TelephonyHandler,
        T: Transport,
        F: FlowControl,
    {
        let Some(inbound) = events::parse(payload) else {
            return;
        };
        self.stats.frames = self.stats.frames.wrapping_add(1);

        let event_id = payload[0];
        if event_id != event::ACK && event_id != event::REPORT_SPP_DATA {
            self.acknowledge(event_id, send);
        }

        match inbound {
            Inbound::Ack { command, status } => {
                self.stats.acks = self.stats.acks.wrapping_add(1);
                if let Some(outcome) = send.ack_received(command, status) {
                    route_outcome(&outcome, at, handler);
                }
            }
            Inbound::AtResult { line, .. } => at.on_result_line(line, handler),
            Inbound::AtResponse { status } => at.on_response(status, handler),
            Inbound::Notify(notification) => {
                if let Notification::Unknown { event_id, data } = notification {
                    self.stats.unknown = self.stats.unknown.wrapping_add(1);
                    debug!("dispatch: unhandled event 0x{:02X} ({} bytes)", event_id, data.len());
                }
                self.stats.notifications = self.stats.notifications.wrapping_add(1);
                handler.on_notification(&notification);
            }
        }
    }

    fn acknowledge<T: Transport, F: FlowControl>(
        &mut self,
        event_id: u8,
        send: &mut SendEngine<'_, T, F>,
    ) {
        let result = Command::EventAck(event_id)
            .encode()
            .and_then(|p| send.send(&p, Origin::Local).map_err(CommandError::from));
        if let Err(e) = result {
            self.stats.event_ack_failures = self.stats.event_ack_failures.wrapping_add(1);
            warn!("dispatch: cannot ACK event 0x{:02X}: {}", event_id, e);
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

/// Deliver a finished command's outcome to whoever asked for it.
///
/// A vendor-AT frame's ACK starts the pending AT entry's response timer; a
/// failure terminates the entry.  A failed
/// make-call becomes a [`Notification::CallFailed`]; other local failures
/// go to [`TelephonyHandler::on_command_failed`].  Forwarded commands are
/// only logged.
pub fn route_outcome<H: TelephonyHandler>(
    outcome: &CommandOutcome,
    at: &mut AtSubsystem<'_, H>,
    handler: &mut H,
) {
    match outcome.origin {
        Origin::AtCommand => {
            if outcome.status.is_ok() {
                at.on_send_acked();
            } else {
                at.on_send_failed(handler);
            }
        }
        Origin::Forwarded => {
            info!(
                "forwarded command 0x{:02X}: {:?}",
                outcome.command, outcome.status
            );
        }
        Origin::Local => {
            handler.on_command_outcome(outcome);
            if outcome.status.is_ok() {
                return;
            }
            if outcome.command == command::MAKE_CALL {
                handler.on_notification(&Notification::CallFailed {
                    command: outcome.command,
                });
            } else {
                handler.on_command_failed(outcome);
            }
        }
    }
}
