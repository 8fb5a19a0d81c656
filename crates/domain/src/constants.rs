//! Workflow constants
//!
//! Centralized location for domain-level constants shared by the wizard, the
//! posting orchestrator and the ERP gateway.

// Posting defaults
pub const DEFAULT_WAREHOUSE_CODE: &str = "7000-FG";
pub const DEFAULT_BRANCH_ID: i32 = 5;

/// SAP B1 object type of a Purchase Order, used as `BaseType` on copied lines.
pub const PURCHASE_ORDER_OBJECT_TYPE: i32 = 22;

// ERP gateway timeouts
pub const ERP_READ_TIMEOUT_SECS: u64 = 30;
pub const ERP_CREATE_TIMEOUT_SECS: u64 = 60;
pub const ERP_CONNECT_TIMEOUT_SECS: u64 = 10;

// Supplier search
pub const SUPPLIER_SEARCH_MIN_CHARS: usize = 2;
pub const SUPPLIER_SEARCH_MAX_RESULTS: usize = 20;

// Database
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
