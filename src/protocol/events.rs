//! Inbound payload → typed event.
//!
//! [`parse`] turns a decoded payload into one of three things: an ACK for
//! the send engine, an AT response for the AT subsystem, or a semantic
//! [`Notification`] for the telephone/UI layer.  Multi-purpose event
//! families (device status, utility requests, low-energy signalling) are
//! split by a nested sub-switch on their second byte.
//!
//! Nothing here allocates: text and data fields borrow from the decoder's
//! payload buffer.

use super::ids::{AckStatus, event};

/// Device/link state carried by the BTM status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    PowerOff,
    /// Discoverable, waiting for a phone to pair.
    Pairing,
    PowerOn,
    PairingComplete,
    PairingFailed,
    HfLinkUp,
    A2dpLinkUp,
    HfLinkDown,
    A2dpLinkDown,
    ScoLinkUp,
    ScoLinkDown,
    AvrcpLinkUp,
    AvrcpLinkDown,
    SppLinkUp,
    SppLinkDown,
    Standby,
    AclDisconnected,
    Other(u8),
}

impl DeviceState {
    fn from_byte(b: u8) -> Self {
        match b {
            0x00 => Self::PowerOff,
            0x01 => Self::Pairing,
            0x02 => Self::PowerOn,
            0x03 => Self::PairingComplete,
            0x04 => Self::PairingFailed,
            0x05 => Self::HfLinkUp,
            0x06 => Self::A2dpLinkUp,
            0x07 => Self::HfLinkDown,
            0x08 => Self::A2dpLinkDown,
            0x09 => Self::ScoLinkUp,
            0x0A => Self::ScoLinkDown,
            0x0B => Self::AvrcpLinkUp,
            0x0C => Self::AvrcpLinkDown,
            0x0D => Self::SppLinkUp,
            0x0E => Self::SppLinkDown,
            0x0F => Self::Standby,
            0x11 => Self::AclDisconnected,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    VoiceDial,
    Incoming,
    Outgoing,
    Active,
    /// A call is active and another is waiting.
    ActiveWithWaiting,
    /// A call is active and another is on hold.
    ActiveWithHeld,
    Other(u8),
}

impl CallState {
    fn from_byte(b: u8) -> Self {
        match b {
            0x00 => Self::Idle,
            0x01 => Self::VoiceDial,
            0x02 => Self::Incoming,
            0x03 => Self::Outgoing,
            0x04 => Self::Active,
            0x05 => Self::ActiveWithWaiting,
            0x06 => Self::ActiveWithHeld,
            other => Self::Other(other),
        }
    }
}

/// Sub-events of the utility request family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityEvent<'a> {
    /// Module asks the MCU to switch the external amplifier.
    AmpControl { on: bool },
    LineInChanged { plugged: bool },
    EepromUpdated,
    Other { code: u8, data: &'a [u8] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeState {
    Standby,
    Advertising,
    Scanning,
    Connected,
    Other(u8),
}

/// Sub-events of the low-energy signalling family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeEvent {
    Status(LeState),
    ConnectionParams {
        interval: u16,
        latency: u16,
        timeout: u16,
    },
    Other { code: u8 },
}

/// Semantic notification for the telephone/UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification<'a> {
    DeviceState { state: DeviceState, link_info: u8 },
    CallStatus { link: u8, state: CallState },
    CallerId { link: u8, number: &'a str },
    SmsReceived { link: u8 },
    MissedCall { link: u8 },
    PhoneBattery { link: u8, level: u8 },
    PhoneMaxBattery { link: u8, level: u8 },
    PhoneSignal { link: u8, level: u8 },
    PhoneMaxSignal { link: u8, level: u8 },
    Roaming { link: u8, roaming: bool },
    Service { link: u8, available: bool },
    HfGain { link: u8, level: u8 },
    Ringtone { ringing: bool },
    LinkStatus { device_state: u8, links: &'a [u8] },
    FirmwareVersion(&'a [u8]),
    LocalAddress([u8; 6]),
    LocalName(&'a str),
    Utility(UtilityEvent<'a>),
    Le(LeEvent),
    /// SPP/iAP passthrough data.
    SppData { link: u8, data: &'a [u8] },
    /// A make-call command failed or was never acknowledged.  Raised by
    /// the bridge, never parsed from the wire.
    CallFailed { command: u8 },
    /// Well-formed frame with an ID this firmware does not interpret, or
    /// a known ID with a truncated payload.
    Unknown { event_id: u8, data: &'a [u8] },
}

/// Routing class of a decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Acknowledgement of one of our commands.
    Ack { command: u8, status: AckStatus },
    /// Text line from the phone that the module did not interpret.
    AtResult { link: u8, line: &'a str },
    /// Final status of the pending vendor AT command (raw code).
    AtResponse { status: u8 },
    Notify(Notification<'a>),
}

/// Classify a decoded payload.  Returns `None` only for an empty payload.
pub fn parse(payload: &[u8]) -> Option<Inbound<'_>> {
    let (&id, data) = payload.split_first()?;

    let unknown = Inbound::Notify(Notification::Unknown { event_id: id, data });

    let inbound = match id {
        event::ACK => match data {
            [command, status, ..] => Inbound::Ack {
                command: *command,
                status: AckStatus::from_byte(*status),
            },
            _ => unknown,
        },
        event::UNKNOWN_AT_RESULT => match data.split_first() {
            Some((&link, text)) => match text_of(text) {
                Some(line) => Inbound::AtResult { link, line },
                None => unknown,
            },
            None => unknown,
        },
        event::VENDOR_AT_CMD_RSP => match data.last() {
            Some(&status) => Inbound::AtResponse { status },
            None => unknown,
        },
        _ => Inbound::Notify(notification(id, data).unwrap_or(Notification::Unknown {
            event_id: id,
            data,
        })),
    };

    Some(inbound)
}

fn notification(id: u8, data: &[u8]) -> Option<Notification<'_>> {
    let n = match id {
        event::BTM_STATUS => Notification::DeviceState {
            state: DeviceState::from_byte(*data.first()?),
            link_info: data.get(1).copied().unwrap_or(0),
        },
        event::CALL_STATUS => Notification::CallStatus {
            link: *data.first()?,
            state: CallState::from_byte(*data.get(1)?),
        },
        event::CALLER_ID => {
            let (&link, digits) = data.split_first()?;
            Notification::CallerId {
                link,
                number: text_of(digits)?,
            }
        }
        event::SMS_RECEIVED => Notification::SmsReceived { link: *data.first()? },
        event::MISSED_CALL => Notification::MissedCall { link: *data.first()? },
        event::PHONE_MAX_BATTERY_LEVEL => {
            let (link, level) = pair(data)?;
            Notification::PhoneMaxBattery { link, level }
        }
        event::PHONE_BATTERY_LEVEL => {
            let (link, level) = pair(data)?;
            Notification::PhoneBattery { link, level }
        }
        event::PHONE_ROAMING_STATUS => {
            let (link, status) = pair(data)?;
            Notification::Roaming {
                link,
                roaming: status != 0,
            }
        }
        event::PHONE_MAX_SIGNAL_STRENGTH => {
            let (link, level) = pair(data)?;
            Notification::PhoneMaxSignal { link, level }
        }
        event::PHONE_SIGNAL_STRENGTH => {
            let (link, level) = pair(data)?;
            Notification::PhoneSignal { link, level }
        }
        event::PHONE_SERVICE_STATUS => {
            let (link, status) = pair(data)?;
            Notification::Service {
                link,
                available: status != 0,
            }
        }
        event::HF_GAIN_LEVEL => {
            let (link, level) = pair(data)?;
            Notification::HfGain { link, level }
        }
        event::RINGTONE_STATUS => Notification::Ringtone {
            ringing: *data.first()? != 0,
        },
        event::REPORT_LINK_STATUS => {
            let (&device_state, links) = data.split_first()?;
            Notification::LinkStatus {
                device_state,
                links,
            }
        }
        event::BTM_VERSION_REPLY => Notification::FirmwareVersion(data),
        event::LOCAL_BD_ADDRESS_REPLY => {
            let addr: [u8; 6] = data.get(..6)?.try_into().ok()?;
            Notification::LocalAddress(addr)
        }
        event::LOCAL_DEVICE_NAME_REPLY => {
            let (&len, rest) = data.split_first()?;
            Notification::LocalName(text_of(rest.get(..len as usize)?)?)
        }
        event::BTM_UTILITY_REQ => {
            let (&code, params) = data.split_first()?;
            Notification::Utility(match code {
                0x00 => UtilityEvent::AmpControl {
                    on: *params.first()? != 0,
                },
                0x01 => UtilityEvent::LineInChanged {
                    plugged: *params.first()? != 0,
                },
                0x03 => UtilityEvent::EepromUpdated,
                _ => UtilityEvent::Other { code, data: params },
            })
        }
        event::LE_SIGNALING => {
            let (&code, params) = data.split_first()?;
            Notification::Le(match code {
                0x00 => LeEvent::Status(match *params.first()? {
                    0x00 => LeState::Standby,
                    0x01 => LeState::Advertising,
                    0x02 => LeState::Scanning,
                    0x03 => LeState::Connected,
                    other => LeState::Other(other),
                }),
                0x01 => LeEvent::ConnectionParams {
                    interval: be16(params, 0)?,
                    latency: be16(params, 2)?,
                    timeout: be16(params, 4)?,
                },
                _ => LeEvent::Other { code },
            })
        }
        event::REPORT_SPP_DATA => {
            let (&link, rest) = data.split_first()?;
            Notification::SppData { link, data: rest }
        }
        _ => return None,
    };
    Some(n)
}

fn pair(data: &[u8]) -> Option<(u8, u8)> {
    Some((*data.first()?, *data.get(1)?))
}

fn be16(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*data.get(at)?, *data.get(at + 1)?]))
}

/// Printable text with trailing CR/LF/NUL trimmed.
fn text_of(bytes: &[u8]) -> Option<&str> {
    let s = core::str::from_utf8(bytes).ok()?;
    Some(s.trim_end_matches(['\r', '\n', '\0']))
}
