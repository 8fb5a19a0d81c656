//! Shared helpers for infra integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use grnflow_domain::{ErpConfig, NewBatch};
use grnflow_infra::database::{DbManager, SqliteBatchStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated database in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("grnflow-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn store(&self) -> SqliteBatchStore {
        SqliteBatchStore::new(Arc::clone(&self.manager))
    }

    /// Run a scalar count query.
    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(sql, [], |row| row.get(0)).expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn new_batch(user_id: i64) -> NewBatch {
    NewBatch {
        user_id,
        customer_code: "C-NORTHWIND".into(),
        customer_name: "Northwind Traders".into(),
    }
}

/// Complete Service Layer settings pointing at a mock server.
pub fn erp_config(server: &MockServer) -> ErpConfig {
    ErpConfig {
        base_url: Some(server.uri()),
        username: Some("manager".into()),
        password: Some("s3cret".into()),
        company_db: Some("SBODEMO".into()),
        verify_ssl: true,
        read_timeout_secs: 5,
        create_timeout_secs: 5,
    }
}

/// Accept every login with the given session id.
pub async fn mount_login(server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/b1s/v1/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(session_id)))
        .mount(server)
        .await;
}

pub fn login_body(session_id: &str) -> Value {
    json!({ "SessionId": session_id, "Version": "1000190", "SessionTimeout": 30 })
}

/// An open purchase order as the Service Layer returns it.
pub fn purchase_order_json(doc_entry: i64, card_code: &str, lines: Value) -> Value {
    json!({
        "DocEntry": doc_entry,
        "DocNum": doc_entry + 4000,
        "CardCode": card_code,
        "CardName": "Northwind Traders",
        "DocDate": "2025-05-28T00:00:00Z",
        "DocDueDate": "2025-06-10T00:00:00Z",
        "DocTotal": 1500.0,
        "DocumentStatus": "bost_Open",
        "DocumentLines": lines
    })
}

pub fn open_line_json(line_num: i32, item_code: &str, open_quantity: f64) -> Value {
    json!({
        "LineNum": line_num,
        "ItemCode": item_code,
        "ItemDescription": format!("{item_code} description"),
        "Quantity": 10.0,
        "OpenQuantity": open_quantity,
        "WarehouseCode": "01",
        "UnitPrice": 12.5,
        "LineStatus": "bost_Open",
        "ManageSerialNumbers": "tNO",
        "ManageBatchNumbers": "tNO"
    })
}

pub fn sap_error(message: &str) -> Value {
    json!({ "error": { "code": -10, "message": { "lang": "en-us", "value": message } } })
}
