//! Log-based telephony handler.
//!
//! Implements [`TelephonyHandler`] by writing every notification and
//! command outcome to the logger (UART console in production).  Used by
//! the firmware until the handset call layer is attached, and by the
//! bring-up build to watch the module talk.

use log::{info, warn};

use crate::app::ports::TelephonyHandler;
use crate::at::AtResponse;
use crate::engine::send::CommandOutcome;
use crate::protocol::events::Notification;

/// Handler that logs everything it receives and counts warnings.
#[derive(Debug, Default)]
pub struct LogTelephony {
    warnings: u32,
}

impl LogTelephony {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times [`TelephonyHandler::flash_warning`] was raised.
    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// AT callback that logs the response.
    pub fn log_at_response(&mut self, rsp: AtResponse<'_>) {
        match rsp.line {
            Some(line) => info!("AT    | {:?} {}", rsp.status, line),
            None => info!("AT    | {:?}", rsp.status),
        }
    }

    /// Unsolicited AT result handler.
    pub fn log_unsolicited(&mut self, line: &str) {
        info!("AT    | unsolicited {}", line);
    }
}

impl TelephonyHandler for LogTelephony {
    fn on_notification(&mut self, notification: &Notification<'_>) {
        match notification {
            Notification::DeviceState { state, link_info } => {
                info!("DEV   | {:?} (link info 0x{:02X})", state, link_info);
            }
            Notification::CallStatus { link, state } => {
                info!("CALL  | link {} -> {:?}", link, state);
            }
            Notification::CallerId { link, number } => {
                info!("CALL  | link {} caller {}", link, number);
            }
            Notification::CallFailed { command } => {
                warn!("CALL  | dial command 0x{:02X} failed", command);
                self.flash_warning();
            }
            Notification::PhoneSignal { link, level }
            | Notification::PhoneBattery { link, level } => {
                info!("PHONE | link {} level {}", link, level);
            }
            Notification::LocalAddress(addr) => {
                info!(
                    "DEV   | address {:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
                    addr[5], addr[4], addr[3], addr[2], addr[1], addr[0]
                );
            }
            Notification::LocalName(name) => info!("DEV   | name '{}'", name),
            Notification::Unknown { event_id, data } => {
                info!("EVENT | 0x{:02X} {:02X?}", event_id, data);
            }
            other => info!("EVENT | {:?}", other),
        }
    }

    fn on_command_outcome(&mut self, outcome: &CommandOutcome) {
        info!(
            "CMD   | 0x{:02X} {:?}",
            outcome.command, outcome.status
        );
    }

    fn flash_warning(&mut self) {
        self.warnings = self.warnings.wrapping_add(1);
    }
}
