//! Batch creation wizard
//!
//! Steps 1-4 of the multi-GRN workflow. Posting (step 5) lives in
//! [`crate::posting`].

pub mod selection;
pub mod service;

pub use selection::{build_line_selections, LineSubmission, SubmittedLine};
pub use service::{LineCandidates, WizardService};
