//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter        | Implements        | Connects to              |
//! |----------------|-------------------|--------------------------|
//! | `config_store` | ConfigPort        | NVS / in-memory blob     |
//! | `log_handler`  | TelephonyHandler  | Serial log output        |
//! | `mfb`          | FlowControl       | Any `OutputPin`          |
//! | `uart`         | Transport         | ESP-IDF UART driver      |

pub mod config_store;
pub mod log_handler;
pub mod mfb;
#[cfg(feature = "espidf")]
pub mod uart;
