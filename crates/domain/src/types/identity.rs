//! Acting identity supplied by the permission gate

use serde::{Deserialize, Serialize};

/// Role of an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    User,
    QcInspector,
    Viewer,
}

crate::impl_domain_status_conversions!(UserRole {
    Admin => "admin",
    Manager => "manager",
    User => "user",
    QcInspector => "qc_inspector",
    Viewer => "viewer",
});

impl UserRole {
    /// Supervisory roles may inspect batches they do not own.
    pub fn can_view_any_batch(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

/// Feature capabilities checked before any workflow step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    MultipleGrn,
}

crate::impl_domain_status_conversions!(Capability {
    MultipleGrn => "multiple_grn",
});

/// The user performing a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        Self { user_id, role }
    }
}
