//! AT command multiplexer.
//!
//! Textual AT commands ride inside the vendor-AT command frame.  The module
//! handles one at a time, so commands queue here and only the oldest is
//! ever submitted to the send engine.  Its outcome arrives by one of four
//! paths:
//!
//! | Source                                   | Effect                           |
//! |------------------------------------------|----------------------------------|
//! | result line starting with the prefix     | callback(`Result`, line), stays pending |
//! | any other result line                    | unsolicited handler              |
//! | vendor-AT response status                | callback(`Ok`/`Error`/`NoResponse`), freed |
//! | frame ACK error / no ACK / timeout       | callback(`Failed` or `NoResponse`), freed |
//!
//! The response timeout runs from the frame's ACK, not from submission: the
//! entry stays pending, and the next one unsubmitted, for as long as its
//! frame waits in the send queue.  Until that ACK arrives no status or
//! result line is attributed to it, since anything the phone says then
//! belongs to an earlier command.
//!
//! The result prefix is the command text up to the first `?` or `=`,
//! followed by `:`.  `+CLCC` matches `+CLCC: 1,0,4,...`; `+VTS=5` matches
//! `+VTS: ...`.

use heapless::{Deque, String};
use log::{debug, info, warn};

use crate::app::ports::{FlowControl, Transport};
use crate::engine::send::{Origin, SendEngine};
use crate::error::AtError;
use crate::protocol::commands::Command;
use crate::ring::RingBuffer;
use crate::timer::Countdown;

/// AT entry slots.
pub const MAX_AT_ENTRIES: usize = 32;

/// Capacity of the shared AT text ring.
pub const AT_TEXT_BUFFER: usize = 512;

/// Longest AT command text (without the leading `AT`).
pub const MAX_AT_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtStatus {
    /// A correlated result line; more may follow before the final status.
    Result,
    Ok,
    Error,
    /// The phone never answered.
    NoResponse,
    /// The module refused or never acknowledged the frame carrying it.
    Failed,
}

impl AtStatus {
    /// Map the vendor-AT response code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Ok,
            0x01 => Self::Error,
            _ => Self::NoResponse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtResponse<'a> {
    pub status: AtStatus,
    /// The matched line for `Result`, `None` otherwise.
    pub line: Option<&'a str>,
}

/// Per-command response callback.  Receives the handler the bridge was
/// polled with.
pub type AtCallback<H> = fn(&mut H, AtResponse<'_>);

/// Receives result lines that match no pending command.
pub type UnsolicitedHandler<H> = fn(&mut H, &str);

/// The submitted head entry.
struct Pending {
    text: String<MAX_AT_LEN>,
    /// The module ACKed the frame carrying it; the response timer runs.
    acked: bool,
}

struct AtEntry<H> {
    start: usize,
    len: usize,
    prefix_len: usize,
    callback: Option<AtCallback<H>>,
}

pub struct AtSubsystem<'t, H> {
    entries: Deque<AtEntry<H>, MAX_AT_ENTRIES>,
    text: RingBuffer<u8, AT_TEXT_BUFFER>,
    /// `None` while nothing is submitted.
    pending: Option<Pending>,
    timer: &'t Countdown,
    response_timeout_ms: u32,
    link: u8,
    unsolicited: Option<UnsolicitedHandler<H>>,
}

impl<'t, H> AtSubsystem<'t, H> {
    pub fn new(timer: &'t Countdown, response_timeout_ms: u32, link: u8) -> Self {
        Self {
            entries: Deque::new(),
            text: RingBuffer::new(),
            pending: None,
            timer,
            response_timeout_ms,
            link,
            unsolicited: None,
        }
    }

    pub fn set_unsolicited_handler(&mut self, handler: UnsolicitedHandler<H>) {
        self.unsolicited = Some(handler);
    }

    /// Queue `text` (e.g. `"+CLCC"`); `callback` receives every response.
    pub fn send(&mut self, text: &str, callback: Option<AtCallback<H>>) -> Result<(), AtError> {
        if text.len() > MAX_AT_LEN {
            return Err(AtError::TooLong);
        }
        if text.is_empty() || !text.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(AtError::InvalidText);
        }
        if self.entries.is_full() {
            return Err(AtError::QueueFull);
        }
        let start = self
            .text
            .push_slice(text.as_bytes())
            .ok_or(AtError::BufferFull)?;

        let prefix_len = text.find(['?', '=']).unwrap_or(text.len());
        // Cannot fail: fullness was checked above.
        let _ = self.entries.push_back(AtEntry {
            start,
            len: text.len(),
            prefix_len,
            callback,
        });
        Ok(())
    }

    /// Queue the keypad tone command for `digit`.
    pub fn send_dtmf(&mut self, digit: char, callback: Option<AtCallback<H>>) -> Result<(), AtError> {
        if !matches!(digit, '0'..='9' | '*' | '#' | 'A'..='D') {
            return Err(AtError::InvalidDigit);
        }
        let mut text: String<8> = String::new();
        // Six ASCII bytes always fit.
        let _ = text.push_str("+VTS=");
        let _ = text.push(digit);
        self.send(&text, callback)
    }

    /// Per-tick task: submit the oldest entry if none is pending, or time
    /// out the pending one.
    pub fn poll<T: Transport, F: FlowControl>(
        &mut self,
        send: &mut SendEngine<'_, T, F>,
        handler: &mut H,
    ) {
        if let Some(acked) = self.pending.as_ref().map(|p| p.acked) {
            if acked && self.timer.is_expired() {
                warn!("at: no response to pending command");
                self.complete(AtStatus::NoResponse, handler);
            }
            return;
        }

        let Some(head) = self.entries.front() else {
            return;
        };
        let mut buf = [0u8; MAX_AT_LEN];
        let n = self.text.copy_out(head.start, head.len, &mut buf);
        let Ok(text) = core::str::from_utf8(&buf[..n]) else {
            // Only printable ASCII is ever queued.
            return;
        };

        let payload = match (Command::VendorAt {
            link: self.link,
            text,
        })
        .encode()
        {
            Ok(p) => p,
            Err(e) => {
                warn!("at: cannot encode '{}': {}", text, e);
                return;
            }
        };

        match send.send(&payload, Origin::AtCommand) {
            Ok(()) => {
                debug!("at: submitted '{}'", text);
                let mut pending = String::new();
                let _ = pending.push_str(text);
                self.pending = Some(Pending {
                    text: pending,
                    acked: false,
                });
            }
            // Send queue is busy; try again next tick.
            Err(e) => debug!("at: submit deferred: {}", e),
        }
    }

    /// A raw result line arrived from the phone.
    pub fn on_result_line(&mut self, line: &str, handler: &mut H) {
        let pending = self.pending.as_ref().filter(|p| p.acked);
        if let (Some(pending), Some(head)) = (pending, self.entries.front()) {
            let prefix = &pending.text[..head.prefix_len];
            if line.starts_with(prefix) && line[prefix.len()..].starts_with(':') {
                if let Some(cb) = head.callback {
                    cb(
                        handler,
                        AtResponse {
                            status: AtStatus::Result,
                            line: Some(line),
                        },
                    );
                }
                return;
            }
        }

        match self.unsolicited {
            Some(cb) => cb(handler, line),
            None => info!("at: unsolicited '{}'", line),
        }
    }

    /// The module reported the final status of the pending command.
    pub fn on_response(&mut self, code: u8, handler: &mut H) {
        match self.pending.as_ref().map(|p| p.acked) {
            Some(true) => self.complete(AtStatus::from_code(code), handler),
            Some(false) => debug!("at: stale response 0x{:02X} before frame ACK", code),
            None => debug!("at: response 0x{:02X} with nothing pending", code),
        }
    }

    /// The module accepted the frame carrying the pending command.
    pub fn on_send_acked(&mut self) {
        if let Some(p) = self.pending.as_mut().filter(|p| !p.acked) {
            p.acked = true;
            self.timer.start(self.response_timeout_ms);
        }
    }

    /// The frame carrying the pending command was rejected or never ACKed.
    pub fn on_send_failed(&mut self, handler: &mut H) {
        if !self.pending.as_ref().is_some_and(|p| !p.acked) {
            return;
        }
        self.complete(AtStatus::Failed, handler);
    }

    fn complete(&mut self, status: AtStatus, handler: &mut H) {
        self.pending = None;
        self.timer.cancel();
        let Some(entry) = self.entries.pop_front() else {
            return;
        };
        self.text.release(entry.len);
        if let Some(cb) = entry.callback {
            cb(handler, AtResponse { status, line: None });
        }
    }

    /// True while a submitted command awaits its final status.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Entries queued, including the pending one.
    pub fn queued(&self) -> usize {
        self.entries.len()
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.timer.cancel();
        self.entries.clear();
        self.text.clear();
    }
}
