//! Role-based permission gate
//!
//! Admins, managers and users hold the multiple-GRN capability by default.
//! Per-user overrides grant or revoke it regardless of role.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use grnflow_core::PermissionGate;
use grnflow_domain::{Actor, Capability, Result, UserRole};
use tracing::debug;

/// Static capability table keyed by role, with per-user overrides.
#[derive(Debug, Clone)]
pub struct RolePermissionGate {
    roles: HashSet<UserRole>,
    overrides: HashMap<i64, bool>,
}

impl Default for RolePermissionGate {
    fn default() -> Self {
        Self {
            roles: [UserRole::Admin, UserRole::Manager, UserRole::User].into_iter().collect(),
            overrides: HashMap::new(),
        }
    }
}

impl RolePermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roles that hold the capability.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = UserRole>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn grant(mut self, user_id: i64) -> Self {
        self.overrides.insert(user_id, true);
        self
    }

    pub fn revoke(mut self, user_id: i64) -> Self {
        self.overrides.insert(user_id, false);
        self
    }
}

#[async_trait]
impl PermissionGate for RolePermissionGate {
    async fn has_capability(&self, actor: &Actor, capability: Capability) -> Result<bool> {
        let allowed = match capability {
            Capability::MultipleGrn => self
                .overrides
                .get(&actor.user_id)
                .copied()
                .unwrap_or_else(|| self.roles.contains(&actor.role)),
        };
        debug!(user_id = actor.user_id, role = %actor.role, %capability, allowed, "capability check");
        Ok(allowed)
    }
}
