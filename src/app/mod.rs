//! Application boundary.
//!
//! The protocol engines talk to hardware and to the handset call layer only
//! through the **port traits** in [`ports`], so the whole bridge runs
//! against mocks on the host.

pub mod ports;
