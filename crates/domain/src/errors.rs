//! Error types used throughout the workflow

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::batch::BatchStatus;

/// Main error type for GrnFlow
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum GrnFlowError {
    /// Required ERP connection parameters are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials rejected, or still unauthorized after one re-login.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network failure or timeout talking to the ERP.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The ERP answered, but rejected the request.
    #[error("ERP error (HTTP {status}): {message}")]
    Erp { status: u16, message: String },

    /// Missing or malformed step input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The same purchase order was selected twice for one batch.
    #[error("Purchase order {po_doc_entry} is already linked to batch {batch_id}")]
    DuplicatePurchaseOrder { batch_id: i64, po_doc_entry: i64 },

    /// A step was invoked while the batch is in a status that does not allow it.
    #[error("Batch {batch_id} is {status}; cannot {operation}")]
    InvalidState { batch_id: i64, status: BatchStatus, operation: String },

    /// Ownership or capability mismatch.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Failure outside the per-link posting loop; the batch has been marked failed.
    #[error("Posting aborted for batch {batch_id}: {reason}")]
    PostingAborted { batch_id: i64, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GrnFlowError {
    /// True for errors detected before any mutation took place.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicatePurchaseOrder { .. }
                | Self::InvalidState { .. }
                | Self::AccessDenied(_)
                | Self::NotFound(_)
        )
    }

    /// Message safe to show to an operator.
    ///
    /// Rejections carry their own reason; infrastructure failures are
    /// collapsed into a generic sentence so raw internals never reach the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => reason.clone(),
            Self::DuplicatePurchaseOrder { po_doc_entry, .. } => {
                format!("Purchase order {po_doc_entry} has already been selected for this batch")
            }
            Self::InvalidState { status, operation, .. } => {
                format!("This batch is {status} and can no longer {operation}")
            }
            Self::AccessDenied(_) => "Access denied".to_string(),
            Self::NotFound(_) => "The requested batch does not exist".to_string(),
            Self::Config(_) => "SAP B1 connection is not configured".to_string(),
            Self::Auth(_) => "SAP B1 login failed".to_string(),
            Self::Connectivity(_) => {
                "SAP B1 could not be reached. Please try again in a few moments.".to_string()
            }
            Self::Erp { message, .. } => format!("SAP B1 rejected the request: {message}"),
            Self::PostingAborted { reason, .. } => format!("Posting failed: {reason}"),
            Self::Database(_) | Self::Internal(_) => {
                "An unexpected error occurred. Please try again or contact support.".to_string()
            }
        }
    }
}

/// Result type alias for GrnFlow operations
pub type Result<T> = std::result::Result<T, GrnFlowError>;
