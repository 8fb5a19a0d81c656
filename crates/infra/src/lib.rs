//! # GrnFlow Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite batch store (r2d2 pool, WAL, cascading foreign keys)
//! - SAP B1 Service Layer gateway with shared, self-renewing session
//! - HTTP client wrapper and error conversions
//! - Configuration loading, permission gate and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `grnflow-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod identity;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use config::{load, load_from_env, load_from_file};
pub use database::{DbManager, SqliteBatchStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use identity::RolePermissionGate;
pub use integrations::sap::ServiceLayerClient;
pub use observability::init_tracing;
