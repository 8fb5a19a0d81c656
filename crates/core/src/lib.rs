//! # GrnFlow Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The batch wizard (steps 1-4) and the posting orchestrator (step 5)
//! - Port interfaces for the batch store, the ERP and the permission gate
//!
//! ## Architecture Principles
//! - Only depends on `grnflow-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod batch;
pub mod posting;
pub mod utils;
pub mod wizard;

// Infrastructure ports
pub mod erp_ports;
pub mod identity_ports;

pub use batch::ports::BatchStore;
pub use erp_ports::ErpGateway;
pub use identity_ports::PermissionGate;
pub use posting::PostingOrchestrator;
pub use utils::clock::{Clock, FixedClock, SystemClock};
pub use wizard::{LineCandidates, LineSubmission, SubmittedLine, WizardService};
