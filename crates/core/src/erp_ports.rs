//! ERP gateway port interfaces
//!
//! The gateway owns its session: implementations log in lazily, re-login once
//! on an unauthorized response and surface a second one as `Auth`.

use async_trait::async_trait;
use grnflow_domain::{CreatedDocument, Customer, DeliveryNote, PartnerType, PurchaseOrder, Result};

/// Typed operations against SAP Business One
#[async_trait]
pub trait ErpGateway: Send + Sync {
    /// All business partners flagged valid, sorted by name.
    async fn fetch_valid_customers(&self) -> Result<Vec<Customer>>;

    /// Valid business partners of one card type.
    async fn fetch_business_partners(&self, partner_type: PartnerType) -> Result<Vec<Customer>>;

    /// Open purchase orders of a counterparty, each reduced to its open lines.
    /// Orders without any open line are omitted.
    async fn fetch_open_purchase_orders(&self, customer_code: &str)
        -> Result<Vec<PurchaseOrder>>;

    /// Create one Purchase Delivery Note.
    async fn create_delivery_note(&self, note: &DeliveryNote) -> Result<CreatedDocument>;
}
