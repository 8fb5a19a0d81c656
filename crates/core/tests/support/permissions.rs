//! Permission gate fake

use std::collections::HashSet;

use async_trait::async_trait;
use grnflow_core::PermissionGate;
use grnflow_domain::{Actor, Capability, Result as DomainResult};

/// Grants the multi-GRN capability to everyone except the denied users.
#[derive(Default)]
pub struct StaticPermissions {
    denied: HashSet<i64>,
}

impl StaticPermissions {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny(mut self, user_id: i64) -> Self {
        self.denied.insert(user_id);
        self
    }
}

#[async_trait]
impl PermissionGate for StaticPermissions {
    async fn has_capability(&self, actor: &Actor, _capability: Capability) -> DomainResult<bool> {
        Ok(!self.denied.contains(&actor.user_id))
    }
}
