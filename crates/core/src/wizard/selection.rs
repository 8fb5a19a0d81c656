//! Step-3 line submission handling
//!
//! Turns the quantities an operator submitted against PO lines into the line
//! selections that get persisted. Only strictly positive quantities survive.

use std::collections::HashSet;

use grnflow_domain::{GrnFlowError, NewLineSelection, PurchaseOrderLine, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lines submitted for one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSubmission {
    pub link_id: i64,
    pub lines: Vec<SubmittedLine>,
}

/// One PO line with the quantity typed by the operator.
///
/// `quantity: None` means the field was left untouched and resolves to the
/// line's open quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedLine {
    pub line: PurchaseOrderLine,
    pub quantity: Option<Decimal>,
}

impl SubmittedLine {
    pub fn new(line: PurchaseOrderLine, quantity: Decimal) -> Self {
        Self { line, quantity: Some(quantity) }
    }

    pub fn resolved_quantity(&self) -> Decimal {
        self.quantity.unwrap_or(self.line.open_quantity)
    }
}

/// Build the selections for one link, omitting non-positive quantities.
///
/// Quantities above the open quantity are kept (over-receipt is not
/// restricted here) but logged.
pub fn build_line_selections(link_id: i64, lines: &[SubmittedLine]) -> Vec<NewLineSelection> {
    lines
        .iter()
        .filter_map(|submitted| {
            let quantity = submitted.resolved_quantity();
            if quantity <= Decimal::ZERO {
                return None;
            }
            let selection = NewLineSelection::from_po_line(link_id, &submitted.line, quantity);
            if selection.exceeds_open_quantity() {
                warn!(
                    link_id,
                    line_num = selection.po_line_num,
                    selected = %selection.selected_quantity,
                    open = %selection.open_quantity,
                    "selected quantity exceeds open quantity"
                );
            }
            Some(selection)
        })
        .collect()
}

/// Reject submissions that name a link twice or a line twice within a link.
pub(crate) fn check_unique(submissions: &[LineSubmission]) -> Result<()> {
    let mut links = HashSet::new();
    for submission in submissions {
        if !links.insert(submission.link_id) {
            return Err(GrnFlowError::Validation(format!(
                "Lines for purchase order link {} were submitted twice",
                submission.link_id
            )));
        }
        let mut line_nums = HashSet::new();
        for submitted in &submission.lines {
            if !line_nums.insert(submitted.line.line_num) {
                return Err(GrnFlowError::Validation(format!(
                    "Line {} of purchase order link {} was submitted twice",
                    submitted.line.line_num, submission.link_id
                )));
            }
        }
    }
    Ok(())
}
