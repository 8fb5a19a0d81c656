//! Service Layer JSON shapes
//!
//! Only the fields this crate reads or writes. Conversion into domain types
//! happens here so the client stays about transport and session handling.

use chrono::NaiveDate;
use grnflow_domain::{Customer, InventoryType, PurchaseOrder, PurchaseOrderLine};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const OPEN_STATUS: &str = "bost_Open";

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(rename = "UserName")]
    pub user_name: &'a str,
    #[serde(rename = "Password")]
    pub password: &'a str,
    #[serde(rename = "CompanyDB")]
    pub company_db: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LoginResponse {
    pub session_id: String,
}

/// OData collection envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ODataList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct BusinessPartnerRow {
    pub card_code: String,
    #[serde(default)]
    pub card_name: Option<String>,
}

impl From<BusinessPartnerRow> for Customer {
    fn from(row: BusinessPartnerRow) -> Self {
        Self { code: row.card_code, name: row.card_name.unwrap_or_default() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PurchaseOrderRow {
    pub doc_entry: i64,
    pub doc_num: i64,
    pub card_code: String,
    #[serde(default)]
    pub card_name: Option<String>,
    #[serde(default)]
    pub doc_date: Option<String>,
    #[serde(default)]
    pub doc_due_date: Option<String>,
    #[serde(default)]
    pub doc_total: Option<f64>,
    #[serde(default)]
    pub document_lines: Vec<PurchaseOrderLineRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PurchaseOrderLineRow {
    pub line_num: i32,
    pub item_code: String,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub open_quantity: Option<f64>,
    #[serde(default)]
    pub warehouse_code: Option<String>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub line_status: Option<String>,
    #[serde(default)]
    pub manage_serial_numbers: Option<String>,
    #[serde(default)]
    pub manage_batch_numbers: Option<String>,
}

impl PurchaseOrderLineRow {
    fn is_open(&self) -> bool {
        self.line_status.as_deref() == Some(OPEN_STATUS)
            && self.open_quantity.unwrap_or_default() > 0.0
    }
}

impl PurchaseOrderRow {
    /// Reduce to a domain order with only open lines; `None` when nothing is open.
    pub fn into_open_order(self) -> Option<PurchaseOrder> {
        let open_lines: Vec<PurchaseOrderLine> = self
            .document_lines
            .into_iter()
            .filter(PurchaseOrderLineRow::is_open)
            .map(|line| PurchaseOrderLine {
                line_num: line.line_num,
                inventory_type: InventoryType::from_erp_flags(
                    line.manage_serial_numbers.as_deref(),
                    line.manage_batch_numbers.as_deref(),
                ),
                item_code: line.item_code,
                item_description: line.item_description.unwrap_or_default(),
                quantity: decimal(line.quantity.unwrap_or_default()),
                open_quantity: decimal(line.open_quantity.unwrap_or_default()),
                warehouse_code: line.warehouse_code.filter(|w| !w.trim().is_empty()),
                unit_price: decimal(line.unit_price.or(line.price).unwrap_or_default()),
                line_status: line.line_status.unwrap_or_default(),
            })
            .collect();

        if open_lines.is_empty() {
            return None;
        }

        Some(PurchaseOrder {
            doc_entry: self.doc_entry,
            doc_num: self.doc_num,
            card_code: self.card_code,
            card_name: self.card_name.unwrap_or_default(),
            doc_date: self.doc_date.as_deref().and_then(parse_date),
            doc_due_date: self.doc_due_date.as_deref().and_then(parse_date),
            doc_total: decimal(self.doc_total.unwrap_or_default()),
            open_lines,
        })
    }
}

/// `{"DocEntry": .., "DocNum": ..}` of a created document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreatedDocumentRow {
    pub doc_entry: i64,
    pub doc_num: i64,
}

/// Service Layer error body: `{"error": {"code": .., "message": {"value": ..}}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: ErrorMessage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    Localized { value: String },
    Plain(String),
}

/// Human-readable message of an error response, falling back to the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.message {
            ErrorMessage::Localized { value } | ErrorMessage::Plain(value) => value,
        },
        Err(_) => body.trim().to_string(),
    }
}

/// Double single quotes so a value can sit inside an OData string literal.
pub(crate) fn odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().normalize()
}

/// Service Layer dates come as `YYYY-MM-DD` or `YYYY-MM-DDT00:00:00Z`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10).and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}
