//! Purchase order fixtures

use chrono::{DateTime, NaiveDate, Utc};
use grnflow_domain::{Actor, InventoryType, PurchaseOrder, PurchaseOrderLine, UserRole};
use rust_decimal::Decimal;

pub const CUSTOMER_CODE: &str = "C-NORTHWIND";
pub const CUSTOMER_NAME: &str = "Northwind Traders";

pub fn now() -> DateTime<Utc> {
    super::fixed_now()
}

pub fn operator() -> Actor {
    Actor::new(7, UserRole::User)
}

pub fn other_user() -> Actor {
    Actor::new(8, UserRole::User)
}

pub fn manager() -> Actor {
    Actor::new(1, UserRole::Manager)
}

pub fn po_line(line_num: i32, open: Decimal) -> PurchaseOrderLine {
    PurchaseOrderLine {
        line_num,
        item_code: format!("FG-{line_num:03}"),
        item_description: format!("Item {line_num}"),
        quantity: open + Decimal::ONE,
        open_quantity: open,
        warehouse_code: Some("01".into()),
        unit_price: Decimal::new(1250, 2),
        line_status: "bost_Open".into(),
        inventory_type: InventoryType::Standard,
    }
}

/// Open purchase order with `lines` open lines of 10 units each.
pub fn purchase_order(doc_entry: i64, lines: i32) -> PurchaseOrder {
    PurchaseOrder {
        doc_entry,
        doc_num: doc_entry + 1000,
        card_code: CUSTOMER_CODE.into(),
        card_name: CUSTOMER_NAME.into(),
        doc_date: NaiveDate::from_ymd_opt(2025, 5, 20),
        doc_due_date: NaiveDate::from_ymd_opt(2025, 6, 20),
        doc_total: Decimal::new(50_000, 2),
        open_lines: (0..lines).map(|n| po_line(n, Decimal::TEN)).collect(),
    }
}
