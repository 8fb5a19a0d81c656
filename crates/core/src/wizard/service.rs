//! Multi-GRN creation wizard - core business logic
//!
//! Drives a batch through `draft → pos_selected → lines_selected → reviewed`.
//! The stored batch status is authoritative: every step checks it before
//! doing anything and rejects out-of-order calls with `InvalidState`.
//! Capability, ownership and input checks all run before any mutation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use grnflow_domain::constants::{SUPPLIER_SEARCH_MAX_RESULTS, SUPPLIER_SEARCH_MIN_CHARS};
use grnflow_domain::{
    Actor, Batch, BatchDetail, BatchStatus, Customer, GrnFlowError, NewBatch, NewPoLink,
    PartnerType, PoLink, PurchaseOrder, PurchaseOrderLine, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::selection::{build_line_selections, check_unique, LineSubmission};
use crate::batch::ports::BatchStore;
use crate::erp_ports::ErpGateway;
use crate::identity_ports::{require_multi_grn, require_owner, PermissionGate};

/// Open lines of one linked purchase order, offered at step 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCandidates {
    pub link: PoLink,
    pub lines: Vec<PurchaseOrderLine>,
}

/// Wizard service
pub struct WizardService {
    store: Arc<dyn BatchStore>,
    erp: Arc<dyn ErpGateway>,
    permissions: Arc<dyn PermissionGate>,
}

impl WizardService {
    /// Create a new wizard service
    pub fn new(
        store: Arc<dyn BatchStore>,
        erp: Arc<dyn ErpGateway>,
        permissions: Arc<dyn PermissionGate>,
    ) -> Self {
        Self { store, erp, permissions }
    }

    /// Batches of the acting user, newest first.
    pub async fn list_batches(&self, actor: &Actor) -> Result<Vec<Batch>> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;
        self.store.list_batches_for_user(actor.user_id).await
    }

    /// Customer dropdown for step 1.
    pub async fn customers(&self, actor: &Actor) -> Result<Vec<Customer>> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;
        self.erp.fetch_valid_customers().await
    }

    /// Supplier lookup by name or code fragment.
    ///
    /// Queries shorter than two characters return nothing without reaching
    /// the ERP.
    pub async fn search_suppliers(&self, actor: &Actor, query: &str) -> Result<Vec<Customer>> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;

        let needle = query.trim().to_lowercase();
        if needle.chars().count() < SUPPLIER_SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }

        let partners = self.erp.fetch_business_partners(PartnerType::Supplier).await?;
        Ok(partners
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle) || p.code.to_lowercase().contains(&needle)
            })
            .take(SUPPLIER_SEARCH_MAX_RESULTS)
            .collect())
    }

    /// Step 1: create a draft batch for a customer.
    pub async fn start_batch(
        &self,
        actor: &Actor,
        customer_code: &str,
        customer_name: &str,
    ) -> Result<Batch> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;

        let customer_code = customer_code.trim();
        let customer_name = customer_name.trim();
        if customer_code.is_empty() || customer_name.is_empty() {
            warn!(user_id = actor.user_id, "batch start rejected: no customer selected");
            return Err(GrnFlowError::Validation("Please select a customer".into()));
        }

        let batch = self
            .store
            .create_batch(NewBatch {
                user_id: actor.user_id,
                customer_code: customer_code.to_string(),
                customer_name: customer_name.to_string(),
            })
            .await?;

        info!(batch_id = batch.id, user_id = actor.user_id, customer_code, "created GRN batch");
        Ok(batch)
    }

    /// Step 2 (read): open purchase orders of the batch's customer.
    pub async fn purchase_order_candidates(
        &self,
        actor: &Actor,
        batch_id: i64,
    ) -> Result<Vec<PurchaseOrder>> {
        let batch =
            self.load_owned(actor, batch_id, &[BatchStatus::Draft], "select purchase orders").await?;

        let orders = self.erp.fetch_open_purchase_orders(&batch.customer_code).await?;
        info!(batch_id, count = orders.len(), "fetched open purchase orders");
        Ok(orders)
    }

    /// Step 2: link the chosen purchase orders to the batch.
    pub async fn select_purchase_orders(
        &self,
        actor: &Actor,
        batch_id: i64,
        orders: Vec<NewPoLink>,
    ) -> Result<Vec<PoLink>> {
        let batch =
            self.load_owned(actor, batch_id, &[BatchStatus::Draft], "select purchase orders").await?;

        if orders.is_empty() {
            warn!(batch_id, "purchase order selection rejected: nothing selected");
            return Err(GrnFlowError::Validation(
                "Please select at least one Purchase Order".into(),
            ));
        }

        let mut seen = HashSet::new();
        for order in &orders {
            if !seen.insert(order.po_doc_entry) {
                warn!(batch_id, po_doc_entry = order.po_doc_entry, "duplicate purchase order");
                return Err(GrnFlowError::DuplicatePurchaseOrder {
                    batch_id,
                    po_doc_entry: order.po_doc_entry,
                });
            }
        }

        // The store re-checks the draft status and the unique constraint inside its transaction.
        let links = self.store.add_links(batch.id, orders).await?;
        info!(batch_id, total_pos = links.len(), "added purchase orders to batch");
        Ok(links)
    }

    /// Step 3 (read): the open lines of every linked purchase order.
    ///
    /// Fetches the customer's open orders once and matches them to links by
    /// document entry. Links whose order is no longer open get no lines.
    pub async fn line_candidates(
        &self,
        actor: &Actor,
        batch_id: i64,
    ) -> Result<Vec<LineCandidates>> {
        let batch = self
            .load_owned(actor, batch_id, &[BatchStatus::PosSelected], "select line items")
            .await?;

        let links = self.store.links_with_lines(batch.id).await?;
        let mut open_orders: HashMap<i64, PurchaseOrder> = self
            .erp
            .fetch_open_purchase_orders(&batch.customer_code)
            .await?
            .into_iter()
            .map(|po| (po.doc_entry, po))
            .collect();

        Ok(links
            .into_iter()
            .map(|entry| {
                let lines = open_orders
                    .remove(&entry.link.po_doc_entry)
                    .map(|po| po.open_lines)
                    .unwrap_or_default();
                if lines.is_empty() {
                    warn!(batch_id, po_doc_entry = entry.link.po_doc_entry, "no open lines");
                }
                LineCandidates { link: entry.link, lines }
            })
            .collect())
    }

    /// Step 3: persist the chosen line quantities for every link.
    ///
    /// Lines whose resolved quantity is not strictly positive are dropped.
    /// Returns the number of line selections written.
    pub async fn select_lines(
        &self,
        actor: &Actor,
        batch_id: i64,
        submissions: Vec<LineSubmission>,
    ) -> Result<usize> {
        let batch = self
            .load_owned(actor, batch_id, &[BatchStatus::PosSelected], "select line items")
            .await?;

        check_unique(&submissions)?;

        let link_ids: HashSet<i64> = self
            .store
            .links_with_lines(batch.id)
            .await?
            .into_iter()
            .map(|entry| entry.link.id)
            .collect();

        let mut selections = Vec::new();
        for submission in &submissions {
            if !link_ids.contains(&submission.link_id) {
                return Err(GrnFlowError::Validation(format!(
                    "Purchase order link {} does not belong to batch {}",
                    submission.link_id, batch.id
                )));
            }
            selections.extend(build_line_selections(submission.link_id, &submission.lines));
        }

        if selections.is_empty() {
            warn!(batch_id, "line selection rejected: no positive quantities");
            return Err(GrnFlowError::Validation(
                "Please select at least one line item with a quantity greater than zero".into(),
            ));
        }

        let written = self.store.add_line_selections(batch.id, selections).await?;
        info!(batch_id, lines = written, "line items selected");
        Ok(written)
    }

    /// Step 4 (read): the accumulated link/line tree for confirmation.
    pub async fn review(&self, actor: &Actor, batch_id: i64) -> Result<BatchDetail> {
        let batch = self
            .load_owned(
                actor,
                batch_id,
                &[BatchStatus::LinesSelected, BatchStatus::Reviewed],
                "be reviewed",
            )
            .await?;
        self.detail(batch).await
    }

    /// Step 4: the operator confirmed the review; the batch may now be posted.
    pub async fn confirm_review(&self, actor: &Actor, batch_id: i64) -> Result<Batch> {
        let mut batch = self
            .load_owned(actor, batch_id, &[BatchStatus::LinesSelected], "be confirmed")
            .await?;

        self.store
            .update_batch_status(batch.id, BatchStatus::LinesSelected, BatchStatus::Reviewed)
            .await?;
        batch.status = BatchStatus::Reviewed;
        info!(batch_id, "batch reviewed and ready to post");
        Ok(batch)
    }

    /// Full batch tree for the owner or a supervisory role, in any status.
    pub async fn view_batch(&self, actor: &Actor, batch_id: i64) -> Result<BatchDetail> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;
        let batch = self.store.get_batch(batch_id).await?;
        if !actor.role.can_view_any_batch() {
            require_owner(&batch, actor)?;
        }
        self.detail(batch).await
    }

    async fn detail(&self, batch: Batch) -> Result<BatchDetail> {
        let links = self.store.links_with_lines(batch.id).await?;
        Ok(BatchDetail { batch, links })
    }

    async fn load_owned(
        &self,
        actor: &Actor,
        batch_id: i64,
        allowed: &[BatchStatus],
        operation: &str,
    ) -> Result<Batch> {
        require_multi_grn(self.permissions.as_ref(), actor).await?;
        let batch = self.store.get_batch(batch_id).await?;
        require_owner(&batch, actor)?;

        if !allowed.contains(&batch.status) {
            warn!(batch_id, status = %batch.status, operation, "out-of-order wizard step");
            return Err(GrnFlowError::InvalidState {
                batch_id,
                status: batch.status,
                operation: operation.to_string(),
            });
        }
        Ok(batch)
    }
}
