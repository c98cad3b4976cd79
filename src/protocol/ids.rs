//! Command and event identifiers of the co-processor's UART command set.
//!
//! The first payload byte of every frame is one of these.  Commands flow
//! MCU → module, events flow module → MCU.

/// Command IDs (MCU → module).
pub mod command {
    pub const MAKE_CALL: u8 = 0x00;
    pub const MMI_ACTION: u8 = 0x02;
    pub const CHANGE_DEVICE_NAME: u8 = 0x05;
    pub const READ_BTM_VERSION: u8 = 0x08;
    pub const VENDOR_AT_CMD: u8 = 0x0A;
    pub const READ_LINK_STATUS: u8 = 0x0D;
    pub const READ_LOCAL_BD_ADDRESS: u8 = 0x0F;
    pub const READ_LOCAL_DEVICE_NAME: u8 = 0x10;
    /// Acknowledge a received event.  Self-acknowledging: the module never
    /// ACKs an event-ACK.
    pub const EVENT_ACK: u8 = 0x14;
    pub const PROFILES_LINK_BACK: u8 = 0x17;
    pub const DISCONNECT: u8 = 0x18;
}

/// Event IDs (module → MCU).
pub mod event {
    /// Acknowledgement of a command: `[ACK, command_id, status]`.
    pub const ACK: u8 = 0x00;
    pub const BTM_STATUS: u8 = 0x01;
    pub const CALL_STATUS: u8 = 0x02;
    pub const CALLER_ID: u8 = 0x03;
    pub const SMS_RECEIVED: u8 = 0x04;
    pub const MISSED_CALL: u8 = 0x05;
    pub const PHONE_MAX_BATTERY_LEVEL: u8 = 0x06;
    pub const PHONE_BATTERY_LEVEL: u8 = 0x07;
    pub const PHONE_ROAMING_STATUS: u8 = 0x08;
    pub const PHONE_MAX_SIGNAL_STRENGTH: u8 = 0x09;
    pub const PHONE_SIGNAL_STRENGTH: u8 = 0x0A;
    pub const PHONE_SERVICE_STATUS: u8 = 0x0B;
    pub const HF_GAIN_LEVEL: u8 = 0x0F;
    pub const BTM_VERSION_REPLY: u8 = 0x18;
    pub const BTM_UTILITY_REQ: u8 = 0x1B;
    pub const VENDOR_AT_CMD_RSP: u8 = 0x1C;
    pub const UNKNOWN_AT_RESULT: u8 = 0x1D;
    pub const REPORT_LINK_STATUS: u8 = 0x1E;
    pub const LOCAL_BD_ADDRESS_REPLY: u8 = 0x20;
    pub const LOCAL_DEVICE_NAME_REPLY: u8 = 0x21;
    /// SPP/iAP data passthrough.  The only event that is never
    /// acknowledged with an event-ACK.
    pub const REPORT_SPP_DATA: u8 = 0x22;
    pub const RINGTONE_STATUS: u8 = 0x24;
    pub const LE_SIGNALING: u8 = 0x32;
}

/// MMI action codes carried by [`command::MMI_ACTION`].
pub mod mmi {
    pub const ACCEPT_CALL: u8 = 0x04;
    pub const REJECT_CALL: u8 = 0x05;
    pub const END_CALL: u8 = 0x06;
    pub const MUTE_MIC: u8 = 0x08;
    pub const UNMUTE_MIC: u8 = 0x09;
    pub const VOICE_DIAL: u8 = 0x0A;
    pub const LAST_NUMBER_REDIAL: u8 = 0x0C;
    pub const QUERY_CALL_LIST: u8 = 0x0F;
    pub const VOLUME_UP: u8 = 0x30;
    pub const VOLUME_DOWN: u8 = 0x31;
    pub const POWER_ON_PRESS: u8 = 0x51;
    pub const POWER_ON_RELEASE: u8 = 0x52;
    pub const POWER_OFF_PRESS: u8 = 0x53;
    pub const POWER_OFF_RELEASE: u8 = 0x54;
    pub const ENTER_PAIRING: u8 = 0x5D;
    pub const EXIT_PAIRING: u8 = 0x6B;
}

/// Status byte of an ACK frame as reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Complete,
    Disallowed,
    UnknownCommand,
    InvalidParameters,
    Busy,
    MemoryFull,
    Other(u8),
}

impl AckStatus {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => Self::Complete,
            0x01 => Self::Disallowed,
            0x02 => Self::UnknownCommand,
            0x03 => Self::InvalidParameters,
            0x04 => Self::Busy,
            0x05 => Self::MemoryFull,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Complete => 0x00,
            Self::Disallowed => 0x01,
            Self::UnknownCommand => 0x02,
            Self::InvalidParameters => 0x03,
            Self::Busy => 0x04,
            Self::MemoryFull => 0x05,
            Self::Other(b) => b,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Complete
    }
}
