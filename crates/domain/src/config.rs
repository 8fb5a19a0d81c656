//! Configuration structures
//!
//! Loaded by `grnflow_infra::config::loader` from the environment or a
//! TOML/JSON file. Every section has serde defaults so partial files work.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BRANCH_ID, DEFAULT_DB_POOL_SIZE, DEFAULT_WAREHOUSE_CODE, ERP_CREATE_TIMEOUT_SECS,
    ERP_READ_TIMEOUT_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub erp: ErpConfig,
    #[serde(default)]
    pub posting: PostingConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

/// SAP B1 Service Layer connection settings.
///
/// Credentials are optional at load time; the gateway reports a
/// configuration error when it first needs to log in without them.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub company_db: Option<String>,
    /// TLS certificate verification. Disabling it is an explicit opt-in.
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_create_timeout")]
    pub create_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_read_timeout() -> u64 {
    ERP_READ_TIMEOUT_SECS
}

fn default_create_timeout() -> u64 {
    ERP_CREATE_TIMEOUT_SECS
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            company_db: None,
            verify_ssl: true,
            read_timeout_secs: ERP_READ_TIMEOUT_SECS,
            create_timeout_secs: ERP_CREATE_TIMEOUT_SECS,
        }
    }
}

impl ErpConfig {
    /// Names of the connection parameters that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("base_url", &self.base_url),
            ("username", &self.username),
            ("password", &self.password),
            ("company_db", &self.company_db),
        ];
        fields
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl fmt::Debug for ErpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("company_db", &self.company_db)
            .field("verify_ssl", &self.verify_ssl)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("create_timeout_secs", &self.create_timeout_secs)
            .finish()
    }
}

/// Fixed values stamped on every delivery note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingConfig {
    #[serde(default = "default_warehouse")]
    pub default_warehouse: String,
    #[serde(default = "default_branch_id")]
    pub branch_id: i32,
}

fn default_warehouse() -> String {
    DEFAULT_WAREHOUSE_CODE.to_string()
}

fn default_branch_id() -> i32 {
    DEFAULT_BRANCH_ID
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self { default_warehouse: default_warehouse(), branch_id: default_branch_id() }
    }
}
