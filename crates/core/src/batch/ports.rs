//! Port interfaces for batch persistence

use async_trait::async_trait;
use grnflow_domain::{
    Batch, BatchStatus, LinkOutcomeUpdate, LinkWithLines, NewBatch, NewLineSelection, NewPoLink,
    PoLink, Result,
};

/// Durable storage for batches, their purchase-order links and line selections.
///
/// Link outcome updates touch a single row so that per-link results stay
/// consistent while other readers inspect the same batch.
///
/// Status transitions are conditional on the current status and happen in
/// the same transaction as the rows they guard. A batch that has already
/// moved on yields `InvalidState` and nothing is written.
#[async_trait]
pub trait BatchStore: Send + Sync {
    // Batch CRUD
    /// Persist a new draft batch and return it with its assigned id.
    async fn create_batch(&self, batch: NewBatch) -> Result<Batch>;

    /// Get a batch by id (`NotFound` when absent).
    async fn get_batch(&self, batch_id: i64) -> Result<Batch>;

    /// All batches owned by a user, newest first.
    async fn list_batches_for_user(&self, user_id: i64) -> Result<Vec<Batch>>;

    /// Move a batch from `from` to `to` without touching anything else.
    async fn update_batch_status(
        &self,
        batch_id: i64,
        from: BatchStatus,
        to: BatchStatus,
    ) -> Result<()>;

    // Wizard steps
    /// Move a `draft` batch to `pos_selected`, insert the links and set
    /// `total_pos` to the batch's link count, all in one transaction.
    async fn add_links(&self, batch_id: i64, links: Vec<NewPoLink>) -> Result<Vec<PoLink>>;

    /// Move a `pos_selected` batch to `lines_selected` and insert the line
    /// selections in one transaction. Returns the number of rows written.
    async fn add_line_selections(
        &self,
        batch_id: i64,
        lines: Vec<NewLineSelection>,
    ) -> Result<usize>;

    /// Links of a batch with their line selections, in link-creation order.
    async fn links_with_lines(&self, batch_id: i64) -> Result<Vec<LinkWithLines>>;

    // Posting
    /// Record when posting of the batch began.
    async fn mark_posting_started(&self, batch_id: i64, at: i64) -> Result<()>;

    /// Write the outcome of one link.
    async fn record_link_outcome(&self, link_id: i64, outcome: LinkOutcomeUpdate) -> Result<()>;

    /// Finish a posting run with its terminal status and recomputed total.
    async fn complete_batch(
        &self,
        batch_id: i64,
        status: BatchStatus,
        total_grns_created: i32,
        completed_at: i64,
    ) -> Result<()>;

    /// Mark a batch failed after an unexpected error, keeping the error text.
    async fn fail_batch(&self, batch_id: i64, error_log: &str, completed_at: i64) -> Result<()>;
}
