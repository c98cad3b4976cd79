//! Sync-word frame codec for the co-processor UART.
//!
//! Wire format:
//! ```text
//! ┌──────┬──────┬─────────┬─────────────────────┬──────────┐
//! │ 0xAA │ 0x00 │ Len (1B)│ Payload (Len bytes) │ Chk (1B) │
//! └──────┴──────┴─────────┴─────────────────────┴──────────┘
//!   (Len + Σ payload + Chk) mod 256 == 0
//! ```
//!
//! The decoder is fed one byte at a time from the RX path and yields a
//! payload slice when a frame with a valid checksum completes.  Bad sync
//! bytes and bad checksums are dropped without an error: resynchronising
//! on the next `0xAA 0x00` is the only recovery there is.

/// First sync byte.
pub const SYNC_0: u8 = 0xAA;
/// Second sync byte.
pub const SYNC_1: u8 = 0x00;

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD: usize = 255;

/// Sync (2) + length (1) + checksum (1).
pub const FRAME_OVERHEAD: usize = 4;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    SyncWaitAa,
    SyncWait00,
    Length,
    Data { remaining: u8 },
    Checksum,
}

/// Streaming frame decoder.
///
/// The payload buffer is reused for every frame: a returned slice must be
/// fully handled before the next byte is pushed (the borrow enforces it).
pub struct FrameDecoder {
    state: DecoderState,
    checksum: u8,
    len: usize,
    payload: [u8; MAX_PAYLOAD],
    dropped: u32,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::SyncWaitAa,
            checksum: 0,
            len: 0,
            payload: [0; MAX_PAYLOAD],
            dropped: 0,
        }
    }

    /// Feed one received byte.
    ///
    /// Returns `Some(payload)` when this byte completed a frame whose
    /// checksum verified.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        match self.state {
            DecoderState::SyncWaitAa => {
                if byte == SYNC_0 {
                    self.state = DecoderState::SyncWait00;
                }
            }
            DecoderState::SyncWait00 => {
                self.state = if byte == SYNC_1 {
                    DecoderState::Length
                } else {
                    DecoderState::SyncWaitAa
                };
            }
            DecoderState::Length => {
                self.checksum = byte;
                self.len = 0;
                self.state = if byte == 0 {
                    DecoderState::Checksum
                } else {
                    DecoderState::Data { remaining: byte }
                };
            }
            DecoderState::Data { remaining } => {
                self.payload[self.len] = byte;
                self.len += 1;
                self.checksum = self.checksum.wrapping_add(byte);
                self.state = if remaining == 1 {
                    DecoderState::Checksum
                } else {
                    DecoderState::Data {
                        remaining: remaining - 1,
                    }
                };
            }
            DecoderState::Checksum => {
                self.state = DecoderState::SyncWaitAa;
                if self.checksum.wrapping_add(byte) == 0 {
                    return Some(&self.payload[..self.len]);
                }
                self.dropped = self.dropped.wrapping_add(1);
            }
        }
        None
    }

    /// Frames discarded because their checksum did not verify.
    pub fn dropped_frames(&self) -> u32 {
        self.dropped
    }

    /// True while no frame is partially assembled.
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::SyncWaitAa
    }

    /// Abandon any partial frame (e.g. after a module reset).
    pub fn reset(&mut self) {
        self.state = DecoderState::SyncWaitAa;
        self.len = 0;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum byte that makes `len + Σ payload + chk` wrap to zero.
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload
        .iter()
        .fold(payload.len() as u8, |acc, b| acc.wrapping_add(*b));
    sum.wrapping_neg()
}

/// Encode `payload` into a complete frame.
///
/// Writes `[AA 00 len payload chk]` into `out_buf` and returns the number
/// of bytes written, or `None` if the payload is empty, exceeds
/// [`MAX_PAYLOAD`], or `out_buf` is too small.
pub fn encode_frame(payload: &[u8], out_buf: &mut [u8]) -> Option<usize> {
    let total = FRAME_OVERHEAD + payload.len();
    if payload.is_empty() || payload.len() > MAX_PAYLOAD || total > out_buf.len() {
        return None;
    }

    out_buf[0] = SYNC_0;
    out_buf[1] = SYNC_1;
    out_buf[2] = payload.len() as u8;
    out_buf[3..3 + payload.len()].copy_from_slice(payload);
    out_buf[total - 1] = checksum(payload);

    Some(total)
}
