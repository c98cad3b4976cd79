//! Unified error types for the bridge firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the main loop
//! handles failures uniformly.  All variants are `Copy`; none of them is
//! fatal.  Framing errors never appear here: corrupt frames are dropped by
//! the decoder and sync resumes on its own.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The outbound command could not be queued.
    Send(SendError),
    /// A command could not be encoded.
    Command(CommandError),
    /// An AT command was rejected before queuing.
    At(AtError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send(e) => write!(f, "send: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::At(e) => write!(f, "at: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Send engine errors
// ---------------------------------------------------------------------------

/// Synchronous rejection by the send engine.  There is no internal retry;
/// the caller decides whether to try again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// All descriptor slots are occupied.
    QueueFull,
    /// The outbound byte ring has no room for the encoded frame.
    BufferFull,
    /// A payload must carry at least the command ID.
    EmptyPayload,
    /// The payload does not fit the one-byte length field.
    PayloadTooLong,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "command queue full"),
            Self::BufferFull => write!(f, "transmit buffer full"),
            Self::EmptyPayload => write!(f, "empty payload"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}

impl From<SendError> for Error {
    fn from(e: SendError) -> Self {
        Self::Send(e)
    }
}

// ---------------------------------------------------------------------------
// Command encoding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Dial string is empty, too long, or contains a non-dialable character.
    InvalidDigits,
    /// Device name is empty or exceeds the module's limit.
    NameTooLong,
    /// The encoded command was refused by the send engine.
    Send(SendError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDigits => write!(f, "invalid dial digits"),
            Self::NameTooLong => write!(f, "device name too long"),
            Self::Send(e) => write!(f, "{e}"),
        }
    }
}

impl From<SendError> for CommandError {
    fn from(e: SendError) -> Self {
        Self::Send(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// AT command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtError {
    /// Text is longer than the maximum AT command length.
    TooLong,
    /// Text is empty or not printable ASCII.
    InvalidText,
    /// Not a DTMF digit (`0-9`, `*`, `#`, `A-D`).
    InvalidDigit,
    /// All AT entry slots are occupied.
    QueueFull,
    /// The AT text ring has no room for this command.
    BufferFull,
}

impl fmt::Display for AtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => write!(f, "AT command too long"),
            Self::InvalidText => write!(f, "AT command text invalid"),
            Self::InvalidDigit => write!(f, "invalid DTMF digit"),
            Self::QueueFull => write!(f, "AT queue full"),
            Self::BufferFull => write!(f, "AT text buffer full"),
        }
    }
}

impl From<AtError> for Error {
    fn from(e: AtError) -> Self {
        Self::At(e)
    }
}

impl std::error::Error for Error {}
impl std::error::Error for SendError {}
impl std::error::Error for CommandError {}
impl std::error::Error for AtError {}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
