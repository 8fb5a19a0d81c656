//! Delivery note payload construction

use chrono::NaiveDate;
use grnflow_domain::constants::PURCHASE_ORDER_OBJECT_TYPE;
use grnflow_domain::{DeliveryNote, DeliveryNoteLine, LinkWithLines, PostingConfig};

/// Build the delivery note for one link and its line selections.
///
/// Every line references its purchase order line (`BaseType` 22) so the ERP
/// draws down the open quantity. Lines without a warehouse fall back to the
/// configured default.
pub fn build_delivery_note(
    batch_id: i64,
    entry: &LinkWithLines,
    today: NaiveDate,
    config: &PostingConfig,
) -> DeliveryNote {
    let link = &entry.link;
    let document_lines = entry
        .lines
        .iter()
        .map(|line| DeliveryNoteLine {
            base_type: PURCHASE_ORDER_OBJECT_TYPE,
            base_entry: link.po_doc_entry,
            base_line: line.po_line_num,
            item_code: line.item_code.clone(),
            quantity: line.selected_quantity,
            warehouse_code: line
                .warehouse_code
                .clone()
                .unwrap_or_else(|| config.default_warehouse.clone()),
        })
        .collect();

    DeliveryNote {
        card_code: link.po_card_code.clone(),
        doc_date: today,
        doc_due_date: today,
        comments: format!("Auto-created from batch {batch_id}"),
        num_at_card: format!("BATCH-{batch_id}-PO-{}", link.po_doc_num),
        bpl_id_assigned_to_invoice: config.branch_id,
        document_lines,
    }
}
