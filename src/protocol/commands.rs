//! Typed outbound commands and their payload encodings.
//!
//! | Command             | Payload                                     |
//! |---------------------|---------------------------------------------|
//! | `MakeCall`          | `00 link digits…`                           |
//! | `Mmi`               | `02 link action`                            |
//! | `ChangeDeviceName`  | `05 offset len name…`                       |
//! | `VendorAt`          | `0A link text…`                             |
//! | `EventAck`          | `14 event_id`                               |
//! | `Read*`             | `id 00`                                     |
//!
//! Encoding only builds the payload; framing and queuing belong to the
//! send engine.

use heapless::Vec;

use super::ids::{command, mmi};
use crate::error::CommandError;

/// Largest payload any command encodes to.
pub const MAX_COMMAND_PAYLOAD: usize = 72;

/// Longest dial string the module accepts.
pub const MAX_DIAL_DIGITS: usize = 19;

/// Longest Bluetooth device name the module stores.
pub const MAX_DEVICE_NAME: usize = 32;

pub type Payload = Vec<u8, MAX_COMMAND_PAYLOAD>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Dial `digits` on the phone behind `link`.
    MakeCall { link: u8, digits: &'a str },
    /// User-interface action (accept, reject, mute, pairing, ...).
    Mmi { link: u8, action: u8 },
    ChangeDeviceName(&'a str),
    /// AT command text without the leading `AT`.
    VendorAt { link: u8, text: &'a str },
    /// Acknowledge the event with this ID.
    EventAck(u8),
    ReadBtmVersion,
    ReadLinkStatus,
    ReadLocalBdAddress,
    ReadLocalDeviceName,
    /// Reconnect to the most recently linked phone.
    LinkBack,
    /// Drop the profiles selected by `flags`.
    Disconnect { flags: u8 },
}

impl Command<'_> {
    pub fn id(&self) -> u8 {
        match self {
            Self::MakeCall { .. } => command::MAKE_CALL,
            Self::Mmi { .. } => command::MMI_ACTION,
            Self::ChangeDeviceName(_) => command::CHANGE_DEVICE_NAME,
            Self::VendorAt { .. } => command::VENDOR_AT_CMD,
            Self::EventAck(_) => command::EVENT_ACK,
            Self::ReadBtmVersion => command::READ_BTM_VERSION,
            Self::ReadLinkStatus => command::READ_LINK_STATUS,
            Self::ReadLocalBdAddress => command::READ_LOCAL_BD_ADDRESS,
            Self::ReadLocalDeviceName => command::READ_LOCAL_DEVICE_NAME,
            Self::LinkBack => command::PROFILES_LINK_BACK,
            Self::Disconnect { .. } => command::DISCONNECT,
        }
    }

    /// Encode into a payload whose first byte is [`Command::id`].
    pub fn encode(&self) -> Result<Payload, CommandError> {
        let mut out = Payload::new();
        push(&mut out, &[self.id()])?;

        match *self {
            Self::MakeCall { link, digits } => {
                if !is_dialable(digits) {
                    return Err(CommandError::InvalidDigits);
                }
                push(&mut out, &[link])?;
                push(&mut out, digits.as_bytes())?;
            }
            Self::Mmi { link, action } => push(&mut out, &[link, action])?,
            Self::ChangeDeviceName(name) => {
                if name.is_empty() || name.len() > MAX_DEVICE_NAME {
                    return Err(CommandError::NameTooLong);
                }
                push(&mut out, &[0x00, name.len() as u8])?;
                push(&mut out, name.as_bytes())?;
            }
            Self::VendorAt { link, text } => {
                push(&mut out, &[link])?;
                push(&mut out, text.as_bytes())?;
            }
            Self::EventAck(event_id) => push(&mut out, &[event_id])?,
            Self::ReadBtmVersion
            | Self::ReadLinkStatus
            | Self::ReadLocalBdAddress
            | Self::ReadLocalDeviceName
            | Self::LinkBack => push(&mut out, &[0x00])?,
            Self::Disconnect { flags } => push(&mut out, &[flags])?,
        }

        Ok(out)
    }
}

fn push(out: &mut Payload, bytes: &[u8]) -> Result<(), CommandError> {
    out.extend_from_slice(bytes)
        .map_err(|_| CommandError::Send(crate::error::SendError::PayloadTooLong))
}

/// Digits, `*`, `#`, `+` and `,` (pause), 1..=19 characters.
pub fn is_dialable(digits: &str) -> bool {
    !digits.is_empty()
        && digits.len() <= MAX_DIAL_DIGITS
        && digits
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'*' | b'#' | b'+' | b','))
}

/// MMI action used to set or clear microphone mute.
pub fn mic_mute_action(muted: bool) -> u8 {
    if muted { mmi::MUTE_MIC } else { mmi::UNMUTE_MIC }
}
