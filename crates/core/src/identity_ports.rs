//! Identity and permission port interfaces
//!
//! Authentication happens outside this crate. The gate only answers whether an
//! already-identified actor may use a feature.

use async_trait::async_trait;
use grnflow_domain::{Actor, Batch, Capability, GrnFlowError, Result};
use tracing::warn;

/// Capability check supplied by the identity collaborator
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Whether `actor` holds `capability`.
    async fn has_capability(&self, actor: &Actor, capability: Capability) -> Result<bool>;
}

/// Reject the actor before any step runs when the multi-GRN capability is missing.
pub(crate) async fn require_multi_grn(gate: &dyn PermissionGate, actor: &Actor) -> Result<()> {
    if gate.has_capability(actor, Capability::MultipleGrn).await? {
        return Ok(());
    }
    warn!(user_id = actor.user_id, role = %actor.role, "multiple GRN capability denied");
    Err(GrnFlowError::AccessDenied("Multiple GRN permissions required".into()))
}

/// Only the owner of a batch may drive its steps.
pub(crate) fn require_owner(batch: &Batch, actor: &Actor) -> Result<()> {
    if batch.user_id == actor.user_id {
        return Ok(());
    }
    warn!(batch_id = batch.id, user_id = actor.user_id, "batch owned by another user");
    Err(GrnFlowError::AccessDenied(format!(
        "user {} does not own batch {}",
        actor.user_id, batch.id
    )))
}
