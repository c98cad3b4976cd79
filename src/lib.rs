//! CarPhone bridge firmware library.
//!
//! Exposes the protocol engines for integration testing and host tooling.
//! All ESP-IDF-specific code is behind the `espidf` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod at;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod pins;
pub mod protocol;
pub mod ring;
pub mod timer;

#[cfg(feature = "espidf")]
pub mod drivers;
