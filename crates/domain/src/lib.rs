//! # GrnFlow Domain
//!
//! Business domain types for the multi-PO goods receipt workflow.
//!
//! This crate contains:
//! - Batch / purchase-order link / line-selection models
//! - ERP document types (purchase orders, delivery notes)
//! - Acting identity and capability types
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other GrnFlow crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
