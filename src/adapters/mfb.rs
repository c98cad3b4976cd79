//! MFB wake line on a GPIO output.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::FlowControl;

/// Drives the module's MFB input high while commands are being sent.
pub struct MfbPin<P: OutputPin> {
    pin: P,
    raised: bool,
}

impl<P: OutputPin> MfbPin<P> {
    /// Takes the pin and drives it low.
    pub fn new(mut pin: P) -> Self {
        if let Err(e) = pin.set_low() {
            warn!("mfb: initial set_low failed: {:?}", e);
        }
        Self { pin, raised: false }
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> FlowControl for MfbPin<P> {
    fn assert_wake(&mut self) {
        match self.pin.set_high() {
            Ok(()) => self.raised = true,
            Err(e) => warn!("mfb: set_high failed: {:?}", e),
        }
    }

    fn release(&mut self) {
        match self.pin.set_low() {
            Ok(()) => self.raised = false,
            Err(e) => warn!("mfb: set_low failed: {:?}", e),
        }
    }
}
