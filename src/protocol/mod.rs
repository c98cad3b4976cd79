//! Wire protocol of the Bluetooth module: framing, identifiers, command
//! encoding and event parsing.

pub mod codec;
pub mod commands;
pub mod events;
pub mod ids;
