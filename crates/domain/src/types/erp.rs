//! ERP-facing document types
//!
//! Purchase orders as read from SAP Business One, and the Purchase Delivery
//! Note payload posted back. The delivery note serializes with the Service
//! Layer's PascalCase field names so adapters can post it as-is.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A business partner reduced to code and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub code: String,
    pub name: String,
}

/// SAP B1 business partner card type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    Supplier,
    Customer,
}

impl PartnerType {
    /// Value of the `CardType` field in the Service Layer.
    pub const fn card_type(self) -> &'static str {
        match self {
            Self::Supplier => "S",
            Self::Customer => "C",
        }
    }
}

/// How a received item is tracked in inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InventoryType {
    Serial,
    Batch,
    #[default]
    Standard,
}

crate::impl_domain_status_conversions!(InventoryType {
    Serial => "serial",
    Batch => "batch",
    Standard => "standard",
});

impl InventoryType {
    /// Derive the tracking mode from the ERP's `tYES`/`tNO` item flags.
    pub fn from_erp_flags(manage_serial: Option<&str>, manage_batch: Option<&str>) -> Self {
        if manage_serial == Some("tYES") {
            Self::Serial
        } else if manage_batch == Some("tYES") {
            Self::Batch
        } else {
            Self::Standard
        }
    }
}

/// An open purchase order with only its still-receivable lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub doc_entry: i64,
    pub doc_num: i64,
    pub card_code: String,
    pub card_name: String,
    pub doc_date: Option<NaiveDate>,
    pub doc_due_date: Option<NaiveDate>,
    pub doc_total: Decimal,
    pub open_lines: Vec<PurchaseOrderLine>,
}

impl PurchaseOrder {
    pub fn total_open_lines(&self) -> usize {
        self.open_lines.len()
    }

    pub fn line(&self, line_num: i32) -> Option<&PurchaseOrderLine> {
        self.open_lines.iter().find(|l| l.line_num == line_num)
    }
}

/// One purchase order line as reported by the ERP at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub line_num: i32,
    pub item_code: String,
    pub item_description: String,
    pub quantity: Decimal,
    pub open_quantity: Decimal,
    pub warehouse_code: Option<String>,
    pub unit_price: Decimal,
    pub line_status: String,
    pub inventory_type: InventoryType,
}

/// Purchase Delivery Note payload (`POST /PurchaseDeliveryNotes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryNote {
    pub card_code: String,
    pub doc_date: NaiveDate,
    pub doc_due_date: NaiveDate,
    pub comments: String,
    pub num_at_card: String,
    #[serde(rename = "BPL_IDAssignedToInvoice")]
    pub bpl_id_assigned_to_invoice: i32,
    pub document_lines: Vec<DeliveryNoteLine>,
}

/// A delivery note line copied from a purchase order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryNoteLine {
    pub base_type: i32,
    pub base_entry: i64,
    pub base_line: i32,
    pub item_code: String,
    #[serde(with = "plain_number")]
    pub quantity: Decimal,
    pub warehouse_code: String,
}

/// Identifiers of a document created in the ERP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub doc_entry: i64,
    pub doc_num: i64,
}

/// The Service Layer expects quantities as JSON numbers, not strings.
mod plain_number {
    use rust_decimal::prelude::FromPrimitive;

    use super::{Decimal, ToPrimitive};

    pub fn serialize<S: serde::Serializer>(value: &Decimal, s: S) -> Result<S::Ok, S::Error> {
        let number = value
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom(format!("quantity {value} out of range")))?;
        s.serialize_f64(number)
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let number = <f64 as serde::Deserialize>::deserialize(d)?;
        Decimal::from_f64(number)
            .ok_or_else(|| serde::de::Error::custom(format!("quantity {number} out of range")))
    }
}
