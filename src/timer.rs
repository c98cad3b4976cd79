//! Millisecond countdowns shared between the tick interrupt and the main loop.
//!
//! The periodic tick calls [`Countdown::tick`]; task code calls
//! [`Countdown::start`] and [`Countdown::is_expired`].  Neither side ever
//! blocks.  The whole state is one `AtomicU32` holding the milliseconds
//! left, `0` meaning expired:
//!
//! ```text
//!   start(ms):  remaining = ms              (store)
//!   cancel():   remaining = 0               (store)
//!   tick():     remaining = remaining - 1   (compare-exchange, stops at 0)
//! ```
//!
//! The tick runs in the esp_timer task, which may sit on the other core, so
//! the decrement is a compare-exchange: a `start` that lands between its
//! load and store makes the exchange fail and retry against the new
//! interval instead of being overwritten.

use core::sync::atomic::{AtomicU32, Ordering};

pub struct Countdown {
    remaining: AtomicU32,
}

impl Countdown {
    /// A countdown that starts out expired.
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU32::new(0),
        }
    }

    /// Arm the countdown for `ms` ticks.  `0` expires immediately.
    pub fn start(&self, ms: u32) {
        self.remaining.store(ms, Ordering::Release);
    }

    /// Force the countdown to the expired state.
    pub fn cancel(&self) {
        self.remaining.store(0, Ordering::Release);
    }

    /// Interrupt context: one millisecond has elapsed.
    pub fn tick(&self) {
        let _ = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                left.checked_sub(1)
            });
    }

    /// Task context: has the armed interval fully elapsed?
    pub fn is_expired(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }

    pub fn remaining_ms(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Every countdown the bridge uses, ticked together by one interrupt.
///
/// Lives in a `static` on target so the tick ISR can reach it; tests keep
/// one on the stack and tick it by hand.
pub struct BridgeTimers {
    /// Send engine: MFB wake, ACK timeout and settle delays.
    pub send: Countdown,
    /// AT subsystem: response timeout for the pending command.
    pub at: Countdown,
}

impl BridgeTimers {
    pub const fn new() -> Self {
        Self {
            send: Countdown::new(),
            at: Countdown::new(),
        }
    }

    /// Interrupt context: advance every countdown by one millisecond.
    pub fn tick(&self) {
        self.send.tick();
        self.at.tick();
    }
}

impl Default for BridgeTimers {
    fn default() -> Self {
        Self::new()
    }
}
