//! Port traits — the boundary between the protocol core and the outside world.
//!
//! ```text
//!   UART ──▶ Transport ──▶ Bridge ──▶ TelephonyHandler (call/UI layer)
//!   MFB  ◀── FlowControl ◀──┘
//! ```
//!
//! Driven adapters (UART driver, MFB pin, config storage) implement these
//! traits.  The [`Bridge`](crate::bridge::Bridge) consumes them via
//! generics, so the protocol engines never touch hardware directly and run
//! unchanged against the mocks in `tests/`.

use crate::config::BridgeConfig;
use crate::engine::send::CommandOutcome;
use crate::protocol::events::Notification;

// ───────────────────────────────────────────────────────────────
// Transport (UART to the co-processor)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented link to the module.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` received bytes into `buf`.
    /// Returns 0 if nothing is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`.  Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Check if received data is waiting.
    fn available(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Flow control (MFB wake line)
// ───────────────────────────────────────────────────────────────

/// The single digital line that wakes the module before a transmission.
pub trait FlowControl {
    /// Raise the line ahead of streaming command bytes.
    fn assert_wake(&mut self);

    /// Drop the line once the outbound queue has drained.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Telephone / UI layer (driven: core → application)
// ───────────────────────────────────────────────────────────────

/// Receives everything the bridge learns from the module.
///
/// The call state machine, handset display and sound generator sit behind
/// this trait.  AT command responses are delivered through the per-command
/// callbacks registered with [`Bridge::at_send`](crate::bridge::Bridge::at_send)
/// and also receive `&mut Self`.
pub trait TelephonyHandler {
    /// A semantic event arrived from the module.
    fn on_notification(&mut self, notification: &Notification<'_>);

    /// A command this layer submitted was ACKed, rejected or timed out.
    fn on_command_outcome(&mut self, _outcome: &CommandOutcome) {}

    /// A command failed without a command-specific recovery.
    fn on_command_failed(&mut self, outcome: &CommandOutcome) {
        log::warn!(
            "command 0x{:02X} failed: {:?}",
            outcome.command,
            outcome.status
        );
        self.flash_warning();
    }

    /// Generic failure indicator on the handset.
    fn flash_warning(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: core ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists bridge configuration.
///
/// Implementations MUST call [`BridgeConfig::validate`] before persisting
/// and reject invalid values rather than clamping them.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<BridgeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &BridgeConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
