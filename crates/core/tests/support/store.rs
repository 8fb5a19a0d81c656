//! In-memory `BatchStore`

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use grnflow_core::BatchStore;
use grnflow_domain::{
    Batch, BatchStatus, GrnFlowError, LineSelection, LinkOutcomeUpdate, LinkStatus,
    LinkWithLines, NewBatch, NewLineSelection, NewPoLink, PoLink, Result as DomainResult,
};

#[derive(Default)]
struct State {
    next_id: i64,
    batches: Vec<Batch>,
    links: Vec<PoLink>,
    lines: Vec<LineSelection>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn batch_mut(&mut self, batch_id: i64) -> DomainResult<&mut Batch> {
        self.batches
            .iter_mut()
            .find(|b| b.id == batch_id)
            .ok_or_else(|| GrnFlowError::NotFound(format!("batch {batch_id}")))
    }

    fn expect_status(
        &mut self,
        batch_id: i64,
        expected: BatchStatus,
        operation: &str,
    ) -> DomainResult<()> {
        let batch = self.batch_mut(batch_id)?;
        if batch.status != expected {
            return Err(GrnFlowError::InvalidState {
                batch_id,
                status: batch.status,
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

/// Vec-backed store mirroring the SQLite adapter's semantics.
///
/// Counts every mutating call so tests can assert that rejected steps wrote
/// nothing.
#[derive(Default)]
pub struct MemoryBatchStore {
    state: Mutex<State>,
    writes: AtomicUsize,
    fail_outcome_writes: AtomicBool,
}

impl MemoryBatchStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make `record_link_outcome` fail from now on.
    pub fn break_outcome_writes(&self) {
        self.fail_outcome_writes.store(true, Ordering::SeqCst);
    }

    pub fn batch(&self, batch_id: i64) -> Batch {
        let state = self.state.lock().unwrap();
        state.batches.iter().find(|b| b.id == batch_id).cloned().unwrap()
    }

    pub fn links(&self, batch_id: i64) -> Vec<PoLink> {
        let state = self.state.lock().unwrap();
        state.links.iter().filter(|l| l.batch_id == batch_id).cloned().collect()
    }

    pub fn line_count(&self) -> usize {
        self.state.lock().unwrap().lines.len()
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BatchStore for MemoryBatchStore {
    async fn create_batch(&self, batch: NewBatch) -> DomainResult<Batch> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let created = Batch {
            id,
            user_id: batch.user_id,
            customer_code: batch.customer_code,
            customer_name: batch.customer_name,
            status: BatchStatus::Draft,
            total_pos: 0,
            total_grns_created: 0,
            error_log: None,
            created_at: super::fixed_now().timestamp(),
            posted_at: None,
            completed_at: None,
        };
        state.batches.push(created.clone());
        Ok(created)
    }

    async fn get_batch(&self, batch_id: i64) -> DomainResult<Batch> {
        let mut state = self.state.lock().unwrap();
        state.batch_mut(batch_id).map(|b| b.clone())
    }

    async fn list_batches_for_user(&self, user_id: i64) -> DomainResult<Vec<Batch>> {
        let state = self.state.lock().unwrap();
        let mut batches: Vec<_> =
            state.batches.iter().filter(|b| b.user_id == user_id).cloned().collect();
        batches.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(batches)
    }

    async fn update_batch_status(
        &self,
        batch_id: i64,
        from: BatchStatus,
        to: BatchStatus,
    ) -> DomainResult<()> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        state.expect_status(batch_id, from, &format!("move to {to}"))?;
        state.batch_mut(batch_id)?.status = to;
        Ok(())
    }

    async fn add_links(&self, batch_id: i64, links: Vec<NewPoLink>) -> DomainResult<Vec<PoLink>> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        state.expect_status(batch_id, BatchStatus::Draft, "select purchase orders")?;

        for link in &links {
            if state.links.iter().any(|l| l.batch_id == batch_id && l.po_doc_entry == link.po_doc_entry)
            {
                return Err(GrnFlowError::DuplicatePurchaseOrder {
                    batch_id,
                    po_doc_entry: link.po_doc_entry,
                });
            }
        }

        let mut created = Vec::with_capacity(links.len());
        for link in links {
            let id = state.next_id();
            let row = PoLink {
                id,
                batch_id,
                po_doc_entry: link.po_doc_entry,
                po_doc_num: link.po_doc_num,
                po_card_code: link.po_card_code,
                po_card_name: link.po_card_name,
                po_doc_date: link.po_doc_date,
                po_doc_total: link.po_doc_total,
                status: LinkStatus::Selected,
                sap_grn_doc_num: None,
                sap_grn_doc_entry: None,
                error_message: None,
                posted_at: None,
                created_at: super::fixed_now().timestamp(),
            };
            state.links.push(row.clone());
            created.push(row);
        }

        let total = state.links.iter().filter(|l| l.batch_id == batch_id).count();
        let batch = state.batch_mut(batch_id)?;
        batch.total_pos = total as i32;
        batch.status = BatchStatus::PosSelected;
        Ok(created)
    }

    async fn add_line_selections(
        &self,
        batch_id: i64,
        lines: Vec<NewLineSelection>,
    ) -> DomainResult<usize> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        state.expect_status(batch_id, BatchStatus::PosSelected, "select line items")?;

        let count = lines.len();
        for line in lines {
            let id = state.next_id();
            state.lines.push(LineSelection {
                id,
                po_link_id: line.po_link_id,
                po_line_num: line.po_line_num,
                item_code: line.item_code,
                item_description: line.item_description,
                ordered_quantity: line.ordered_quantity,
                open_quantity: line.open_quantity,
                selected_quantity: line.selected_quantity,
                warehouse_code: line.warehouse_code,
                unit_price: line.unit_price,
                line_status: line.line_status,
                inventory_type: line.inventory_type,
                created_at: super::fixed_now().timestamp(),
            });
        }
        state.batch_mut(batch_id)?.status = BatchStatus::LinesSelected;
        Ok(count)
    }

    async fn links_with_lines(&self, batch_id: i64) -> DomainResult<Vec<LinkWithLines>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .links
            .iter()
            .filter(|l| l.batch_id == batch_id)
            .map(|link| LinkWithLines {
                link: link.clone(),
                lines: state.lines.iter().filter(|s| s.po_link_id == link.id).cloned().collect(),
            })
            .collect())
    }

    async fn mark_posting_started(&self, batch_id: i64, at: i64) -> DomainResult<()> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        state.batch_mut(batch_id)?.posted_at = Some(at);
        Ok(())
    }

    async fn record_link_outcome(
        &self,
        link_id: i64,
        outcome: LinkOutcomeUpdate,
    ) -> DomainResult<()> {
        if self.fail_outcome_writes.load(Ordering::SeqCst) {
            return Err(GrnFlowError::Database("disk I/O error".into()));
        }
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let link = state
            .links
            .iter_mut()
            .find(|l| l.id == link_id)
            .ok_or_else(|| GrnFlowError::NotFound(format!("link {link_id}")))?;

        link.status = outcome.status();
        match outcome {
            LinkOutcomeUpdate::Posted { doc_num, doc_entry, posted_at } => {
                link.sap_grn_doc_num = Some(doc_num);
                link.sap_grn_doc_entry = Some(doc_entry);
                link.posted_at = Some(posted_at);
                link.error_message = None;
            }
            LinkOutcomeUpdate::Failed { error } => link.error_message = Some(error),
        }
        Ok(())
    }

    async fn complete_batch(
        &self,
        batch_id: i64,
        status: BatchStatus,
        total_grns_created: i32,
        completed_at: i64,
    ) -> DomainResult<()> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let batch = state.batch_mut(batch_id)?;
        batch.status = status;
        batch.total_grns_created = total_grns_created;
        batch.completed_at = Some(completed_at);
        Ok(())
    }

    async fn fail_batch(
        &self,
        batch_id: i64,
        error_log: &str,
        completed_at: i64,
    ) -> DomainResult<()> {
        self.wrote();
        let mut state = self.state.lock().unwrap();
        let batch = state.batch_mut(batch_id)?;
        batch.status = BatchStatus::Failed;
        batch.error_log = Some(error_log.to_string());
        batch.completed_at = Some(completed_at);
        Ok(())
    }
}
