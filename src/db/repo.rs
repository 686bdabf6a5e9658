//! Repository: the SQLite-backed `LedgerStore`.

use crate::domain::{
    EntryStatus, LedgerEntry, LineItemId, OrderId, ProductId, StatusReason, TimeMs,
};
use crate::store::{LedgerStore, StoreError};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// SQLite repository for ledger entries.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Count active entries for a product (certificate/ownership queries).
    pub async fn count_active(&self, product_id: &ProductId) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM ledger_entries WHERE product_id = ? AND status = 'active'",
        )
        .bind(product_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(row.0)
    }

    /// Distinct product ids present in the ledger (sweep enumeration).
    pub async fn product_ids(&self) -> Result<Vec<ProductId>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT product_id FROM ledger_entries ORDER BY product_id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(rows
            .iter()
            .map(|r| ProductId::new(r.get::<String, _>("product_id")))
            .collect())
    }
}

#[async_trait]
impl LedgerStore for Repository {
    async fn get_entry(&self, line_item_id: &LineItemId) -> Result<Option<LedgerEntry>, StoreError> {
        let row = sqlx::query("SELECT * FROM ledger_entries WHERE line_item_id = ?")
            .bind(line_item_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(|r| row_to_entry(&r)).transpose()
    }

    async fn entries_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query("SELECT * FROM ledger_entries WHERE product_id = ?")
            .bind(product_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn entries_for_order(&self, order_id: &OrderId) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query("SELECT * FROM ledger_entries WHERE order_id = ?")
            .bind(order_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn upsert_batch(
        &self,
        product_id: &ProductId,
        entries: &[LedgerEntry],
    ) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // Two phases: clear edition numbers on every row in the batch first,
        // then write final values. The partial unique index on
        // (product_id, edition_number) is enforced per statement, and a
        // resequencing pass can move a row onto a number another batch row is
        // about to vacate.
        for entry in entries {
            sqlx::query(
                "UPDATE ledger_entries SET edition_number = NULL WHERE line_item_id = ? AND product_id = ?",
            )
            .bind(entry.line_item_id.as_str())
            .bind(product_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries
                    (line_item_id, product_id, order_id, status, status_reason,
                     edition_number, edition_total, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(line_item_id) DO UPDATE SET
                    status = excluded.status,
                    status_reason = excluded.status_reason,
                    edition_number = excluded.edition_number,
                    edition_total = excluded.edition_total,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(entry.line_item_id.as_str())
            .bind(entry.product_id.as_str())
            .bind(entry.order_id.as_str())
            .bind(entry.status.as_str())
            .bind(entry.status_reason.as_str())
            .bind(entry.edition_number)
            .bind(entry.edition_total)
            .bind(entry.created_at.as_i64())
            .bind(entry.updated_at.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<LedgerEntry, StoreError> {
    let status_str: String = row.get("status");
    let reason_str: String = row.get("status_reason");

    let status = EntryStatus::parse(&status_str)
        .ok_or_else(|| StoreError::Backend(format!("unknown status in ledger row: {}", status_str)))?;
    let status_reason = StatusReason::parse(&reason_str).ok_or_else(|| {
        StoreError::Backend(format!("unknown status_reason in ledger row: {}", reason_str))
    })?;

    Ok(LedgerEntry {
        line_item_id: LineItemId::new(row.get::<String, _>("line_item_id")),
        product_id: ProductId::new(row.get::<String, _>("product_id")),
        order_id: OrderId::new(row.get::<String, _>("order_id")),
        status,
        status_reason,
        edition_number: row.get("edition_number"),
        edition_total: row.get("edition_total"),
        created_at: TimeMs::new(row.get("created_at")),
        updated_at: TimeMs::new(row.get("updated_at")),
    })
}

fn map_sqlx_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        use sqlx::error::ErrorKind;
        if matches!(db.kind(), ErrorKind::UniqueViolation | ErrorKind::CheckViolation) {
            return StoreError::Conflict(db.to_string());
        }
    }
    StoreError::Backend(e.to_string())
}
