//! Step 5: posting a reviewed batch to the ERP
//!
//! One delivery note per link that has line selections. Links fail
//! independently; the batch completes when at least one note was created.

pub mod orchestrator;
pub mod payload;

pub use orchestrator::PostingOrchestrator;
pub use payload::build_delivery_note;
