//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `GRNFLOW_DB_PATH` is absent or a value is invalid, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GRNFLOW_DB_PATH`: Database file path (required for env loading)
//! - `GRNFLOW_DB_POOL_SIZE`: Connection pool size
//! - `GRNFLOW_SAP_SERVER`: Service Layer base URL
//! - `GRNFLOW_SAP_USERNAME`, `GRNFLOW_SAP_PASSWORD`, `GRNFLOW_SAP_COMPANY_DB`
//! - `GRNFLOW_SAP_SSL_VERIFY`: TLS verification (true/false), default true
//! - `GRNFLOW_DEFAULT_WAREHOUSE`: Warehouse for lines without one
//! - `GRNFLOW_BRANCH_ID`: Branch stamped on delivery notes
//! - `GRNFLOW_LOG_LEVEL`: Default tracing filter
//!
//! Missing ERP credentials are not a load error; the gateway reports them
//! when it first needs to log in.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./grnflow.{json,toml}` or `./config.{json,toml}` (current working directory)
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use grnflow_domain::{Config, DatabaseConfig, ErpConfig, GrnFlowError, PostingConfig, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["grnflow.json", "grnflow.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `GrnFlowError::Config` if neither source yields a valid config.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `GRNFLOW_DB_PATH` is required; everything else falls back to the
/// same defaults a config file would get.
///
/// # Errors
/// Returns `GrnFlowError::Config` if the database path is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("GRNFLOW_DB_PATH")?;
    let defaults = ErpConfig::default();
    let posting_defaults = PostingConfig::default();

    Ok(Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: env_parse("GRNFLOW_DB_POOL_SIZE", "pool size")?
                .unwrap_or(grnflow_domain::constants::DEFAULT_DB_POOL_SIZE),
        },
        erp: ErpConfig {
            base_url: env_opt("GRNFLOW_SAP_SERVER"),
            username: env_opt("GRNFLOW_SAP_USERNAME"),
            password: env_opt("GRNFLOW_SAP_PASSWORD"),
            company_db: env_opt("GRNFLOW_SAP_COMPANY_DB"),
            verify_ssl: env_bool("GRNFLOW_SAP_SSL_VERIFY", true),
            ..defaults
        },
        posting: PostingConfig {
            default_warehouse: env_opt("GRNFLOW_DEFAULT_WAREHOUSE")
                .unwrap_or(posting_defaults.default_warehouse),
            branch_id: env_parse("GRNFLOW_BRANCH_ID", "branch id")?
                .unwrap_or(posting_defaults.branch_id),
        },
        log_level: env_opt("GRNFLOW_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Format is detected by file extension.
///
/// # Errors
/// Returns `GrnFlowError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GrnFlowError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GrnFlowError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GrnFlowError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GrnFlowError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GrnFlowError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GrnFlowError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Returns the first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        GrnFlowError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-blank value of an optional variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| GrnFlowError::Config(format!("Invalid {what}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
/// Unset or unrecognised values yield `default`.
fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            tracing::warn!(key, value = other, "unrecognised boolean, using default");
            default
        }
        None => default,
    }
}
