//! Posting orchestrator
//!
//! Posts a reviewed batch link by link. A failing link is recorded and the
//! loop continues; only errors outside the per-link ERP call abort the run,
//! in which case the batch is marked failed with the error text.

use std::sync::Arc;

use dashmap::DashSet;
use grnflow_domain::{
    Actor, Batch, BatchStatus, GrnFlowError, LinkOutcome, LinkOutcomeUpdate, LinkStatus,
    LinkWithLines, PostingConfig, PostingReport, Result,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::payload::build_delivery_note;
use crate::batch::ports::BatchStore;
use crate::erp_ports::ErpGateway;
use crate::identity_ports::{require_multi_grn, require_owner, PermissionGate};
use crate::utils::clock::Clock;

/// Posting orchestrator
///
/// Holds a per-batch single-flight guard so two callers cannot post the same
/// batch at once. Different batches post concurrently.
pub struct PostingOrchestrator {
    store: Arc<dyn BatchStore>,
    erp: Arc<dyn ErpGateway>,
    permissions: Arc<dyn PermissionGate>,
    clock: Arc<dyn Clock>,
    config: PostingConfig,
    in_flight: DashSet<i64>,
}

/// Releases the batch id from the in-flight set on drop.
struct InFlightGuard<'a> {
    set: &'a DashSet<i64>,
    batch_id: i64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.batch_id);
    }
}

impl PostingOrchestrator {
    pub fn new(
        store: Arc<dyn BatchStore>,
        erp: Arc<dyn ErpGateway>,
        permissions: Arc<dyn PermissionGate>,
        clock: Arc<dyn Clock>,
        config: PostingConfig,
    ) -> Self {
        Self { store, erp, permissions, clock, config, in_flight: DashSet::new() }
    }

    /// Post every link of a reviewed batch and finalize the batch.
    ///
    /// Rejections (capability, ownership, status, concurrent post) happen
    /// before anything is written. Once posting has started, a fatal error
    /// marks the batch failed and is returned as `PostingAborted`.
    #[instrument(
        name = "post_batch",
        skip(self, actor),
        fields(user_id = actor.user_id, run_id = %Uuid::new_v4())
    )]
    pub async fn post(&self, actor: &Actor, batch_id: i64) -> Result<PostingReport> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;

        let _guard = self.claim(batch_id)?;

        let batch = self.store.get_batch(batch_id).await?;
        require_owner(&batch, actor)?;
        if batch.status != BatchStatus::Reviewed {
            warn!(batch_id, status = %batch.status, "posting rejected: batch not reviewed");
            return Err(GrnFlowError::InvalidState {
                batch_id,
                status: batch.status,
                operation: "be posted".to_string(),
            });
        }

        match self.run(&batch).await {
            Ok(report) => Ok(report),
            Err(err) => {
                let reason = err.to_string();
                error!(batch_id, error = %reason, "posting aborted");
                if let Err(mark_err) =
                    self.store.fail_batch(batch_id, &reason, self.clock.timestamp()).await
                {
                    error!(batch_id, error = %mark_err, "could not mark batch as failed");
                }
                Err(GrnFlowError::PostingAborted { batch_id, reason })
            }
        }
    }

    fn claim(&self, batch_id: i64) -> Result<InFlightGuard<'_>> {
        if !self.in_flight.insert(batch_id) {
            warn!(batch_id, "posting rejected: already in progress");
            return Err(GrnFlowError::Validation(format!(
                "Batch {batch_id} is already being posted"
            )));
        }
        Ok(InFlightGuard { set: &self.in_flight, batch_id })
    }

    async fn run(&self, batch: &Batch) -> Result<PostingReport> {
        let batch_id = batch.id;
        self.store.mark_posting_started(batch_id, self.clock.timestamp()).await?;

        let links = self.store.links_with_lines(batch_id).await?;
        info!(batch_id, links = links.len(), "posting batch");

        let mut results = Vec::with_capacity(links.len());
        for entry in &links {
            if entry.lines.is_empty() {
                info!(batch_id, link_id = entry.link.id, "skipping link without line selections");
                continue;
            }
            // Left over from an interrupted run; the note already exists in the ERP.
            if entry.link.status == LinkStatus::Posted {
                info!(
                    batch_id,
                    link_id = entry.link.id,
                    doc_num = ?entry.link.sap_grn_doc_num,
                    "link already posted, not posting again"
                );
                results.push(LinkOutcome {
                    link_id: entry.link.id,
                    po_num: entry.link.po_doc_num,
                    success: true,
                    grn_num: entry.link.sap_grn_doc_num,
                    error: None,
                });
                continue;
            }
            results.push(self.post_link(batch_id, entry).await?);
        }

        let total_success = results.iter().filter(|r| r.success).count();
        let total_failed = results.len() - total_success;
        let status =
            if total_success > 0 { BatchStatus::Completed } else { BatchStatus::Failed };
        let created = i32::try_from(total_success)
            .map_err(|_| GrnFlowError::Internal("delivery note count overflow".into()))?;

        self.store.complete_batch(batch_id, status, created, self.clock.timestamp()).await?;
        info!(batch_id, %status, total_success, total_failed, "batch posting finished");

        Ok(PostingReport { batch_id, status, results, total_success, total_failed })
    }

    /// Create one delivery note and record the outcome on the link.
    ///
    /// ERP failures are captured in the outcome. Only a failure to record
    /// the outcome is propagated.
    async fn post_link(&self, batch_id: i64, entry: &LinkWithLines) -> Result<LinkOutcome> {
        let link = &entry.link;
        let note = build_delivery_note(batch_id, entry, self.clock.today(), &self.config);

        match self.erp.create_delivery_note(&note).await {
            Ok(created) => {
                self.store
                    .record_link_outcome(
                        link.id,
                        LinkOutcomeUpdate::Posted {
                            doc_num: created.doc_num,
                            doc_entry: created.doc_entry,
                            posted_at: self.clock.timestamp(),
                        },
                    )
                    .await?;
                info!(
                    batch_id,
                    link_id = link.id,
                    po_doc_num = link.po_doc_num,
                    doc_num = created.doc_num,
                    "delivery note created"
                );
                Ok(LinkOutcome {
                    link_id: link.id,
                    po_num: link.po_doc_num,
                    success: true,
                    grn_num: Some(created.doc_num),
                    error: None,
                })
            }
            Err(err) => {
                let message = link_error_message(&err);
                warn!(
                    batch_id,
                    link_id = link.id,
                    po_doc_num = link.po_doc_num,
                    error = %message,
                    "delivery note failed"
                );
                self.store
                    .record_link_outcome(
                        link.id,
                        LinkOutcomeUpdate::Failed { error: message.clone() },
                    )
                    .await?;
                Ok(LinkOutcome {
                    link_id: link.id,
                    po_num: link.po_doc_num,
                    success: false,
                    grn_num: None,
                    error: Some(message),
                })
            }
        }
    }
}

/// ERP rejections keep the ERP's own message; anything else is described in full.
fn link_error_message(err: &GrnFlowError) -> String {
    match err {
        GrnFlowError::Erp { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
