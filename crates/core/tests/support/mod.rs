//! Shared test helpers for `grnflow-core` integration tests.
//!
//! In-memory fakes for every core port plus small fixture builders, so the
//! wizard and posting tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;
pub mod permissions;
pub mod store;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use grnflow_core::{FixedClock, PostingOrchestrator, WizardService};
use grnflow_domain::PostingConfig;

pub use gateway::ScriptedErp;
pub use permissions::StaticPermissions;
pub use store::MemoryBatchStore;

/// Everything a workflow test needs, wired to the same fakes.
pub struct Harness {
    pub store: Arc<MemoryBatchStore>,
    pub erp: Arc<ScriptedErp>,
    pub permissions: Arc<StaticPermissions>,
    pub wizard: WizardService,
    pub orchestrator: PostingOrchestrator,
}

impl Harness {
    pub fn new(erp: ScriptedErp) -> Self {
        Self::with_permissions(erp, StaticPermissions::allow_all())
    }

    pub fn with_permissions(erp: ScriptedErp, permissions: StaticPermissions) -> Self {
        let store = Arc::new(MemoryBatchStore::default());
        let erp = Arc::new(erp);
        let permissions = Arc::new(permissions);
        let clock = Arc::new(FixedClock(fixtures::now()));

        let wizard = WizardService::new(store.clone(), erp.clone(), permissions.clone());
        let orchestrator = PostingOrchestrator::new(
            store.clone(),
            erp.clone(),
            permissions.clone(),
            clock,
            PostingConfig::default(),
        );

        Self { store, erp, permissions, wizard, orchestrator }
    }
}

/// Fixed "now" used by every harness: 2025-06-02 09:30:00 UTC.
pub fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap()
}
