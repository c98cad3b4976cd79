//! UART transport on the ESP-IDF UART driver.

use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::uart::UartDriver;
use esp_idf_sys::EspError;

use crate::app::ports::Transport;

/// Non-blocking [`Transport`] over a configured [`UartDriver`].
///
/// The driver's own ring buffers stand in for the receive interrupt; the
/// bridge drains them from its poll loop.
pub struct UartTransport<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartTransport<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.uart.write(data)
    }

    fn available(&self) -> bool {
        self.uart.remaining_read().map(|n| n > 0).unwrap_or(false)
    }
}
