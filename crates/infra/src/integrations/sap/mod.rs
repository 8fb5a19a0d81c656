//! SAP Business One Service Layer integration
//!
//! [`ServiceLayerClient`] implements the core `ErpGateway` port over the
//! Service Layer REST API (`/b1s/v1`):
//!
//! - `POST Login` yields a `SessionId`, sent back as the `B1SESSION` cookie
//! - `GET BusinessPartners` / `GET PurchaseOrders` with OData `$filter`/`$select`
//! - `POST PurchaseDeliveryNotes` creates a goods receipt against PO lines
//!
//! # Usage
//!
//! ```no_run
//! use grnflow_core::ErpGateway;
//! use grnflow_domain::ErpConfig;
//! use grnflow_infra::integrations::sap::ServiceLayerClient;
//!
//! # async fn example() -> grnflow_domain::Result<()> {
//! let client = ServiceLayerClient::new(ErpConfig {
//!     base_url: Some("https://sap.example.com:50000".into()),
//!     username: Some("manager".into()),
//!     password: Some("secret".into()),
//!     company_db: Some("SBODEMO".into()),
//!     ..ErpConfig::default()
//! })?;
//!
//! let orders = client.fetch_open_purchase_orders("V1000").await?;
//! println!("{} open purchase orders", orders.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - Missing connection parameters: `GrnFlowError::Config`, never retried
//! - Unauthorized after one re-login: `GrnFlowError::Auth`
//! - Timeouts and refused connections: `GrnFlowError::Connectivity`, not retried
//! - Any other non-success status: `GrnFlowError::Erp` with the Service Layer message

pub mod client;
mod session;
mod wire;

pub use client::ServiceLayerClient;
