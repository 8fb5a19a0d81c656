//! Batch persistence
//!
//! This module provides the storage port used by the wizard and the posting
//! orchestrator.

pub mod ports;

pub use ports::BatchStore;
