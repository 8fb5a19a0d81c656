//! Domain types and models

pub mod batch;
pub mod erp;
pub mod identity;

pub use batch::{
    Batch, BatchDetail, BatchStatus, LineSelection, LinkOutcome, LinkOutcomeUpdate, LinkStatus,
    LinkWithLines, NewBatch, NewLineSelection, NewPoLink, PoLink, PostingReport,
};
pub use erp::{
    CreatedDocument, Customer, DeliveryNote, DeliveryNoteLine, InventoryType, PartnerType,
    PurchaseOrder, PurchaseOrderLine,
};
pub use identity::{Actor, Capability, UserRole};
