//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level when it is set and non-empty.
//! Installation happens at most once per process; later calls are no-ops.

use std::env;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Filter directive used when `RUST_LOG` is absent.
pub fn default_directive(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("grnflow_core={level},grnflow_infra={level},warn")
}

/// Install the global fmt subscriber, JSON-formatted when `json` is set.
pub fn init_tracing(level: &str, json: bool) {
    TRACING.get_or_init(|| {
        let directive = env::var("RUST_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default_directive(level));
        let filter = EnvFilter::try_new(&directive)
            .unwrap_or_else(|_| EnvFilter::new(default_directive("info")));

        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
        // A subscriber installed by the host application takes precedence.
        let _ = if json { builder.json().try_init() } else { builder.try_init() };
    });
}
