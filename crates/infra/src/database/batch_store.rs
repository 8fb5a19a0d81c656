//! SQLite-backed batch store
//!
//! Batches, purchase-order links and line selections live in three tables
//! joined by foreign keys with cascading deletes. Quantities and amounts are
//! stored as decimal text so nothing is lost to floating point.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use grnflow_core::BatchStore;
use grnflow_domain::{
    Batch, BatchStatus, GrnFlowError, InventoryType, LineSelection, LinkOutcomeUpdate, LinkStatus,
    LinkWithLines, NewBatch, NewLineSelection, NewPoLink, PoLink, Result,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager};

const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

const BATCH_COLUMNS: &str = "id, user_id, customer_code, customer_name, status, total_pos, \
     total_grns_created, error_log, created_at, posted_at, completed_at";

const LINK_COLUMNS: &str = "id, batch_id, po_doc_entry, po_doc_num, po_card_code, po_card_name, \
     po_doc_date, po_doc_total, status, sap_grn_doc_num, sap_grn_doc_entry, error_message, \
     posted_at, created_at";

/// Batch store over the shared SQLite pool.
pub struct SqliteBatchStore {
    db: Arc<DbManager>,
}

impl SqliteBatchStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Run `f` on a pooled connection off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<T> {
            let mut conn = db.get_connection()?;
            f(&mut *conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl BatchStore for SqliteBatchStore {
    async fn create_batch(&self, batch: NewBatch) -> Result<Batch> {
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO grn_batches (user_id, customer_code, customer_name, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    batch.user_id,
                    batch.customer_code,
                    batch.customer_name,
                    BatchStatus::Draft.as_str(),
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;

            let id = conn.last_insert_rowid();
            debug!(batch_id = id, "inserted batch");
            query_batch(conn, id)
        })
        .await
    }

    async fn get_batch(&self, batch_id: i64) -> Result<Batch> {
        self.blocking(move |conn| query_batch(conn, batch_id)).await
    }

    async fn list_batches_for_user(&self, user_id: i64) -> Result<Vec<Batch>> {
        self.blocking(move |conn| {
            let sql = format!(
                "SELECT {BATCH_COLUMNS} FROM grn_batches WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt.query_map(params![user_id], map_batch_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
    }

    async fn update_batch_status(
        &self,
        batch_id: i64,
        from: BatchStatus,
        to: BatchStatus,
    ) -> Result<()> {
        self.blocking(move |conn| {
            let operation = format!("move to {to}");
            transition(conn, batch_id, from, to, &operation)
        })
        .await
    }

    async fn add_links(&self, batch_id: i64, links: Vec<NewPoLink>) -> Result<Vec<PoLink>> {
        self.blocking(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            transition(
                &tx,
                batch_id,
                BatchStatus::Draft,
                BatchStatus::PosSelected,
                "select purchase orders",
            )?;

            let now = Utc::now().timestamp();
            let mut ids = Vec::with_capacity(links.len());
            for link in &links {
                tx.execute(
                    "INSERT INTO grn_po_links (batch_id, po_doc_entry, po_doc_num, po_card_code,
                         po_card_name, po_doc_date, po_doc_total, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        batch_id,
                        link.po_doc_entry,
                        link.po_doc_num,
                        link.po_card_code,
                        link.po_card_name,
                        link.po_doc_date.map(|d| d.to_string()),
                        link.po_doc_total.to_string(),
                        LinkStatus::Selected.as_str(),
                        now,
                    ],
                )
                .map_err(|err| duplicate_link_error(err, batch_id, link.po_doc_entry))?;
                ids.push(tx.last_insert_rowid());
            }

            tx.execute(
                "UPDATE grn_batches
                 SET total_pos = (SELECT COUNT(*) FROM grn_po_links WHERE batch_id = ?1)
                 WHERE id = ?1",
                params![batch_id],
            )
            .map_err(map_sql_error)?;

            let inserted = ids
                .into_iter()
                .map(|id| query_link(&tx, id))
                .collect::<Result<Vec<_>>>()?;
            tx.commit().map_err(map_sql_error)?;
            Ok(inserted)
        })
        .await
    }

    async fn add_line_selections(
        &self,
        batch_id: i64,
        lines: Vec<NewLineSelection>,
    ) -> Result<usize> {
        self.blocking(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            transition(
                &tx,
                batch_id,
                BatchStatus::PosSelected,
                BatchStatus::LinesSelected,
                "select line items",
            )?;

            let now = Utc::now().timestamp();
            for line in &lines {
                let owner: Option<i64> = tx
                    .query_row(
                        "SELECT batch_id FROM grn_po_links WHERE id = ?1",
                        params![line.po_link_id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(map_sql_error)?;
                if owner != Some(batch_id) {
                    return Err(GrnFlowError::Validation(format!(
                        "Purchase order link {} does not belong to batch {batch_id}",
                        line.po_link_id
                    )));
                }

                tx.execute(
                    "INSERT INTO grn_line_selections (po_link_id, po_line_num, item_code,
                         item_description, ordered_quantity, open_quantity, selected_quantity,
                         warehouse_code, unit_price, line_status, inventory_type, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        line.po_link_id,
                        line.po_line_num,
                        line.item_code,
                        line.item_description,
                        line.ordered_quantity.to_string(),
                        line.open_quantity.to_string(),
                        line.selected_quantity.to_string(),
                        line.warehouse_code,
                        line.unit_price.to_string(),
                        line.line_status,
                        line.inventory_type.as_str(),
                        now,
                    ],
                )
                .map_err(map_sql_error)?;
            }

            tx.commit().map_err(map_sql_error)?;
            Ok(lines.len())
        })
        .await
    }

    async fn links_with_lines(&self, batch_id: i64) -> Result<Vec<LinkWithLines>> {
        self.blocking(move |conn| {
            let sql = format!("SELECT {LINK_COLUMNS} FROM grn_po_links WHERE batch_id = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let links = stmt
                .query_map(params![batch_id], map_link_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let mut stmt = conn
                .prepare(
                    "SELECT s.id, s.po_link_id, s.po_line_num, s.item_code, s.item_description,
                            s.ordered_quantity, s.open_quantity, s.selected_quantity,
                            s.warehouse_code, s.unit_price, s.line_status, s.inventory_type,
                            s.created_at
                     FROM grn_line_selections s
                     JOIN grn_po_links l ON l.id = s.po_link_id
                     WHERE l.batch_id = ?1
                     ORDER BY s.id",
                )
                .map_err(map_sql_error)?;
            let mut lines_by_link: HashMap<i64, Vec<LineSelection>> = HashMap::new();
            let rows = stmt.query_map(params![batch_id], map_line_row).map_err(map_sql_error)?;
            for row in rows {
                let line = row.map_err(map_sql_error)?;
                lines_by_link.entry(line.po_link_id).or_default().push(line);
            }

            Ok(links
                .into_iter()
                .map(|link| {
                    let lines = lines_by_link.remove(&link.id).unwrap_or_default();
                    LinkWithLines { link, lines }
                })
                .collect())
        })
        .await
    }

    async fn mark_posting_started(&self, batch_id: i64, at: i64) -> Result<()> {
        self.blocking(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE grn_batches SET posted_at = ?1 WHERE id = ?2",
                    params![at, batch_id],
                )
                .map_err(map_sql_error)?;
            ensure_batch_updated(updated, batch_id)
        })
        .await
    }

    async fn record_link_outcome(&self, link_id: i64, outcome: LinkOutcomeUpdate) -> Result<()> {
        self.blocking(move |conn| {
            let status = outcome.status();
            let updated = match outcome {
                LinkOutcomeUpdate::Posted { doc_num, doc_entry, posted_at } => conn.execute(
                    "UPDATE grn_po_links
                     SET status = ?1, sap_grn_doc_num = ?2, sap_grn_doc_entry = ?3,
                         posted_at = ?4, error_message = NULL
                     WHERE id = ?5",
                    params![status.as_str(), doc_num, doc_entry, posted_at, link_id],
                ),
                LinkOutcomeUpdate::Failed { error } => conn.execute(
                    "UPDATE grn_po_links SET status = ?1, error_message = ?2 WHERE id = ?3",
                    params![status.as_str(), error, link_id],
                ),
            }
            .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(GrnFlowError::NotFound(format!("purchase order link {link_id}")));
            }
            Ok(())
        })
        .await
    }

    async fn complete_batch(
        &self,
        batch_id: i64,
        status: BatchStatus,
        total_grns_created: i32,
        completed_at: i64,
    ) -> Result<()> {
        self.blocking(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE grn_batches
                     SET status = ?1, total_grns_created = ?2, completed_at = ?3
                     WHERE id = ?4",
                    params![status.as_str(), total_grns_created, completed_at, batch_id],
                )
                .map_err(map_sql_error)?;
            ensure_batch_updated(updated, batch_id)
        })
        .await
    }

    async fn fail_batch(&self, batch_id: i64, error_log: &str, completed_at: i64) -> Result<()> {
        let error_log = error_log.to_string();
        self.blocking(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE grn_batches SET status = ?1, error_log = ?2, completed_at = ?3
                     WHERE id = ?4",
                    params![BatchStatus::Failed.as_str(), error_log, completed_at, batch_id],
                )
                .map_err(map_sql_error)?;
            ensure_batch_updated(updated, batch_id)
        })
        .await
    }
}

// ============================================================================
// Queries
// ============================================================================

fn query_batch(conn: &Connection, batch_id: i64) -> Result<Batch> {
    let sql = format!("SELECT {BATCH_COLUMNS} FROM grn_batches WHERE id = ?1");
    conn.query_row(&sql, params![batch_id], map_batch_row)
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| GrnFlowError::NotFound(format!("batch {batch_id}")))
}

fn query_link(conn: &Connection, link_id: i64) -> Result<PoLink> {
    let sql = format!("SELECT {LINK_COLUMNS} FROM grn_po_links WHERE id = ?1");
    conn.query_row(&sql, params![link_id], map_link_row).map_err(map_sql_error)
}

/// Conditional status change; `InvalidState` when the batch is elsewhere.
fn transition(
    conn: &Connection,
    batch_id: i64,
    from: BatchStatus,
    to: BatchStatus,
    operation: &str,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE grn_batches SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![to.as_str(), batch_id, from.as_str()],
        )
        .map_err(map_sql_error)?;
    if updated == 1 {
        return Ok(());
    }

    let current = query_batch(conn, batch_id)?;
    debug!(batch_id, status = %current.status, expected = %from, "status transition refused");
    Err(GrnFlowError::InvalidState {
        batch_id,
        status: current.status,
        operation: operation.to_string(),
    })
}

fn ensure_batch_updated(updated: usize, batch_id: i64) -> Result<()> {
    if updated == 0 {
        return Err(GrnFlowError::NotFound(format!("batch {batch_id}")));
    }
    Ok(())
}

fn duplicate_link_error(err: rusqlite::Error, batch_id: i64, po_doc_entry: i64) -> GrnFlowError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
        {
            GrnFlowError::DuplicatePurchaseOrder { batch_id, po_doc_entry }
        }
        _ => map_sql_error(err),
    }
}

// ============================================================================
// Row mappers
// ============================================================================

fn map_batch_row(row: &Row<'_>) -> rusqlite::Result<Batch> {
    Ok(Batch {
        id: row.get(0)?,
        user_id: row.get(1)?,
        customer_code: row.get(2)?,
        customer_name: row.get(3)?,
        status: parse_enum::<BatchStatus>(row, 4)?,
        total_pos: row.get(5)?,
        total_grns_created: row.get(6)?,
        error_log: row.get(7)?,
        created_at: row.get(8)?,
        posted_at: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

fn map_link_row(row: &Row<'_>) -> rusqlite::Result<PoLink> {
    let doc_date: Option<String> = row.get(6)?;
    let po_doc_date = doc_date
        .map(|raw| {
            NaiveDate::from_str(&raw)
                .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))
        })
        .transpose()?;

    Ok(PoLink {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        po_doc_entry: row.get(2)?,
        po_doc_num: row.get(3)?,
        po_card_code: row.get(4)?,
        po_card_name: row.get(5)?,
        po_doc_date,
        po_doc_total: parse_decimal(row, 7)?,
        status: parse_enum::<LinkStatus>(row, 8)?,
        sap_grn_doc_num: row.get(9)?,
        sap_grn_doc_entry: row.get(10)?,
        error_message: row.get(11)?,
        posted_at: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn map_line_row(row: &Row<'_>) -> rusqlite::Result<LineSelection> {
    Ok(LineSelection {
        id: row.get(0)?,
        po_link_id: row.get(1)?,
        po_line_num: row.get(2)?,
        item_code: row.get(3)?,
        item_description: row.get(4)?,
        ordered_quantity: parse_decimal(row, 5)?,
        open_quantity: parse_decimal(row, 6)?,
        selected_quantity: parse_decimal(row, 7)?,
        warehouse_code: row.get(8)?,
        unit_price: parse_decimal(row, 9)?,
        line_status: row.get(10)?,
        inventory_type: parse_enum::<InventoryType>(row, 11)?,
        created_at: row.get(12)?,
    })
}

fn parse_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_enum<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
    })
}

fn map_join_error(err: task::JoinError) -> GrnFlowError {
    if err.is_cancelled() {
        GrnFlowError::Internal("blocking task cancelled".into())
    } else {
        GrnFlowError::Internal(format!("blocking task failed: {err}"))
    }
}
