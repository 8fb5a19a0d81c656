//! Batch, link and line-selection model
//!
//! A [`Batch`] is one multi-PO receiving operation. It owns its [`PoLink`]s,
//! and every link owns its [`LineSelection`]s. Identifiers are assigned by
//! the persistence layer; timestamps are unix seconds.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::erp::{InventoryType, PurchaseOrder, PurchaseOrderLine};

/// Wizard lifecycle of a batch.
///
/// `Draft → PosSelected → LinesSelected → Reviewed → Completed | Failed`.
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Draft,
    PosSelected,
    LinesSelected,
    Reviewed,
    Completed,
    Failed,
}

crate::impl_domain_status_conversions!(BatchStatus {
    Draft => "draft",
    PosSelected => "pos_selected",
    LinesSelected => "lines_selected",
    Reviewed => "reviewed",
    Completed => "completed",
    Failed => "failed",
});

impl BatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::PosSelected)
                | (Self::PosSelected, Self::LinesSelected)
                | (Self::LinesSelected, Self::Reviewed)
                | (Self::Reviewed, Self::Completed)
                | (Self::Reviewed, Self::Failed)
        )
    }
}

/// One multi-PO receiving operation owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub user_id: i64,
    pub customer_code: String,
    pub customer_name: String,
    pub status: BatchStatus,
    pub total_pos: i32,
    pub total_grns_created: i32,
    pub error_log: Option<String>,
    pub created_at: i64,
    pub posted_at: Option<i64>,
    pub completed_at: Option<i64>,
}

/// Input for creating a batch at step 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBatch {
    pub user_id: i64,
    pub customer_code: String,
    pub customer_name: String,
}

/// Posting status of a single link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Selected,
    Posted,
    Failed,
}

crate::impl_domain_status_conversions!(LinkStatus {
    Selected => "selected",
    Posted => "posted",
    Failed => "failed",
});

/// Association between a batch and one ERP purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoLink {
    pub id: i64,
    pub batch_id: i64,
    pub po_doc_entry: i64,
    pub po_doc_num: i64,
    pub po_card_code: String,
    pub po_card_name: String,
    pub po_doc_date: Option<NaiveDate>,
    pub po_doc_total: Decimal,
    pub status: LinkStatus,
    pub sap_grn_doc_num: Option<i64>,
    pub sap_grn_doc_entry: Option<i64>,
    pub error_message: Option<String>,
    pub posted_at: Option<i64>,
    pub created_at: i64,
}

/// Purchase order data submitted at step 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPoLink {
    pub po_doc_entry: i64,
    pub po_doc_num: i64,
    pub po_card_code: String,
    pub po_card_name: String,
    pub po_doc_date: Option<NaiveDate>,
    pub po_doc_total: Decimal,
}

impl From<&PurchaseOrder> for NewPoLink {
    fn from(po: &PurchaseOrder) -> Self {
        Self {
            po_doc_entry: po.doc_entry,
            po_doc_num: po.doc_num,
            po_card_code: po.card_code.clone(),
            po_card_name: po.card_name.clone(),
            po_doc_date: po.doc_date,
            po_doc_total: po.doc_total,
        }
    }
}

/// A receiving quantity chosen against one purchase order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSelection {
    pub id: i64,
    pub po_link_id: i64,
    pub po_line_num: i32,
    pub item_code: String,
    pub item_description: String,
    pub ordered_quantity: Decimal,
    pub open_quantity: Decimal,
    pub selected_quantity: Decimal,
    pub warehouse_code: Option<String>,
    pub unit_price: Decimal,
    pub line_status: String,
    pub inventory_type: InventoryType,
    pub created_at: i64,
}

/// Line selection ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLineSelection {
    pub po_link_id: i64,
    pub po_line_num: i32,
    pub item_code: String,
    pub item_description: String,
    pub ordered_quantity: Decimal,
    pub open_quantity: Decimal,
    pub selected_quantity: Decimal,
    pub warehouse_code: Option<String>,
    pub unit_price: Decimal,
    pub line_status: String,
    pub inventory_type: InventoryType,
}

impl NewLineSelection {
    /// Copy the ERP line attributes and attach the chosen quantity.
    pub fn from_po_line(po_link_id: i64, line: &PurchaseOrderLine, selected: Decimal) -> Self {
        Self {
            po_link_id,
            po_line_num: line.line_num,
            item_code: line.item_code.clone(),
            item_description: line.item_description.clone(),
            ordered_quantity: line.quantity,
            open_quantity: line.open_quantity,
            selected_quantity: selected,
            warehouse_code: line.warehouse_code.clone().filter(|code| !code.trim().is_empty()),
            unit_price: line.unit_price,
            line_status: line.line_status.clone(),
            inventory_type: line.inventory_type,
        }
    }

    /// True when more is being received than the ERP reported as open.
    pub fn exceeds_open_quantity(&self) -> bool {
        self.selected_quantity > self.open_quantity
    }
}

/// A link together with its line selections, in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkWithLines {
    pub link: PoLink,
    pub lines: Vec<LineSelection>,
}

/// Full tree of a batch, used by the review step and the batch view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDetail {
    pub batch: Batch,
    pub links: Vec<LinkWithLines>,
}

impl BatchDetail {
    pub fn total_lines(&self) -> usize {
        self.links.iter().map(|l| l.lines.len()).sum()
    }

    /// Links that will produce a delivery note when posted.
    pub fn postable_links(&self) -> usize {
        self.links.iter().filter(|l| !l.lines.is_empty()).count()
    }
}

/// Outcome fields written onto a link by the posting orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LinkOutcomeUpdate {
    Posted { doc_num: i64, doc_entry: i64, posted_at: i64 },
    Failed { error: String },
}

impl LinkOutcomeUpdate {
    pub fn status(&self) -> LinkStatus {
        match self {
            Self::Posted { .. } => LinkStatus::Posted,
            Self::Failed { .. } => LinkStatus::Failed,
        }
    }
}

/// Per-link entry of a posting report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub link_id: i64,
    pub po_num: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grn_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of posting a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReport {
    pub batch_id: i64,
    pub status: BatchStatus,
    pub results: Vec<LinkOutcome>,
    pub total_success: usize,
    pub total_failed: usize,
}
