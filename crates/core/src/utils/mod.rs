//! Shared helpers for the core services

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
