//! Bridge configuration parameters
//!
//! Timing and link parameters for the co-processor bridge.  Values can be
//! overridden from the persisted config blob (see
//! [`ConfigPort`](crate::app::ports::ConfigPort)).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::protocol::commands::MAX_DEVICE_NAME;

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Send engine ---
    /// Delay between raising MFB and the first command byte (ms)
    pub mfb_wait_ms: u32,
    /// How long to wait for the module's ACK frame (ms)
    pub ack_timeout_ms: u32,
    /// Settle delay after an ACK (or ACK failure) before the next command (ms)
    pub ack_settle_ms: u32,
    /// Settle delay after sending an event-ACK, which is never ACKed (ms)
    pub event_ack_settle_ms: u32,

    // --- AT subsystem ---
    /// How long a submitted AT command may wait for OK/ERROR (ms)
    pub at_response_timeout_ms: u32,

    // --- Link ---
    /// Link (paired device database) index used for calls and AT commands
    pub link_index: u8,
    /// UART baud rate to the module
    pub uart_baud: u32,
    /// Bluetooth name advertised by the module
    pub device_name: String<MAX_DEVICE_NAME>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut device_name = String::new();
        // Fits: the literal is shorter than MAX_DEVICE_NAME.
        let _ = device_name.push_str("CarPhone");

        Self {
            // Send engine
            mfb_wait_ms: 3,
            ack_timeout_ms: 1000,
            ack_settle_ms: 20,
            event_ack_settle_ms: 2,

            // AT subsystem
            at_response_timeout_ms: 5000,

            // Link
            link_index: 0,
            uart_baud: 115_200,
            device_name,
        }
    }
}

impl BridgeConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.mfb_wait_ms == 0 {
            return Err("mfb_wait_ms must be non-zero");
        }
        if self.ack_timeout_ms == 0 || self.ack_timeout_ms <= self.mfb_wait_ms {
            return Err("ack_timeout_ms must exceed mfb_wait_ms");
        }
        if self.at_response_timeout_ms < self.ack_timeout_ms {
            return Err("at_response_timeout_ms must cover an ACK timeout");
        }
        if self.uart_baud == 0 {
            return Err("uart_baud must be non-zero");
        }
        if self.device_name.is_empty() {
            return Err("device_name must not be empty");
        }
        Ok(())
    }

    /// Serialise to the compact persisted form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
