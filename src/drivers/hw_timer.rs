//! 1 ms tick timer using ESP-IDF's esp_timer API.
//!
//! The callback runs in the esp_timer task and only calls
//! [`BridgeTimers::tick`], which touches nothing but atomics.

use esp_idf_svc::sys::*;
use log::info;

use crate::timer::BridgeTimers;

/// Tick period in microseconds.
const TICK_PERIOD_US: u64 = 1_000;

unsafe extern "C" fn tick_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static BridgeTimers` passed to `start`.
    let timers = unsafe { &*(arg as *const BridgeTimers) };
    timers.tick();
}

/// Handle to the running tick timer.
pub struct TickTimer {
    handle: esp_timer_handle_t,
}

impl TickTimer {
    /// Start ticking `timers` every millisecond.
    pub fn start(timers: &'static BridgeTimers) -> Result<Self, EspError> {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::from_ref(timers).cast_mut().cast(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"bridge_tick".as_ptr(),
            skip_unhandled_events: false,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlives the call; the timer only reads `timers`,
        // which is 'static.
        unsafe {
            esp!(esp_timer_create(&args, &mut handle))?;
            esp!(esp_timer_start_periodic(handle, TICK_PERIOD_US))?;
        }
        info!("hw_timer: 1 kHz bridge tick started");
        Ok(Self { handle })
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        // SAFETY: handle came from a successful esp_timer_create.
        unsafe {
            esp_timer_stop(self.handle);
            esp_timer_delete(self.handle);
        }
    }
}
