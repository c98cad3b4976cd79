//! ESP-IDF peripheral drivers.

pub mod hw_timer;
