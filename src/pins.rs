//! GPIO / peripheral pin assignments for the handset bridge board.
//!
//! Single source of truth: adapters and `main` reference these rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Bluetooth module UART
// ---------------------------------------------------------------------------

/// MCU TX → module RX.
pub const BT_UART_TX_GPIO: i32 = 17;
/// Module TX → MCU RX.
pub const BT_UART_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Flow control
// ---------------------------------------------------------------------------

/// Module MFB input.  HIGH wakes the UART receiver ahead of a command.
pub const BT_MFB_GPIO: i32 = 4;

/// Module reset line (active LOW).  Held HIGH in normal operation.
pub const BT_RESET_GPIO: i32 = 5;
