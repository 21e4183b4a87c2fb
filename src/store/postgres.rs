//! Postgres-backed record store.
//!
//! Two loose-schema tables: `source_records` (mutable, status-tracked) and
//! `menu_items` (append-only JSONB documents). Every gateway call is a
//! single statement, so each is atomic on its own.

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::{RecordStore, StoreError};
use crate::record::{MenuItem, RecordStatus, SourceRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS source_records (
    id      TEXT PRIMARY KEY,
    status  TEXT NOT NULL DEFAULT 'pending',
    payload JSONB NOT NULL DEFAULT '{}'::jsonb
);
CREATE TABLE IF NOT EXISTS menu_items (
    seq  BIGSERIAL PRIMARY KEY,
    item JSONB NOT NULL
);
"#;

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the two collections if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: &PgRow) -> Result<SourceRecord, StoreError> {
        let id: String = row.try_get("id")?;
        let status_value: String = row.try_get("status")?;
        let status = RecordStatus::parse(&status_value).ok_or_else(|| {
            StoreError::InvalidStatus {
                id: id.clone(),
                value: status_value,
            }
        })?;
        let payload: Value = row.try_get("payload")?;
        let payload = match payload {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        Ok(SourceRecord {
            id,
            status,
            payload,
        })
    }
}

impl RecordStore for PgRecordStore {
    async fn list_by_status(
        &self,
        status: RecordStatus,
    ) -> Result<Vec<SourceRecord>, StoreError> {
        let rows = sqlx::query("SELECT id, status, payload FROM source_records WHERE status = $1")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn claim(&self, id: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE source_records SET status = 'working' WHERE id = $1 AND status = 'pending'")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_status(&self, id: &str, status: RecordStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE source_records SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected(format!("no record with id {id}")));
        }
        Ok(())
    }

    async fn insert_items(&self, items: &[MenuItem]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }

        // One statement for the whole batch keeps the bulk insert atomic.
        let batch = serde_json::to_value(items)
            .map_err(|e| StoreError::Rejected(format!("unserializable items: {e}")))?;
        sqlx::query("INSERT INTO menu_items (item) SELECT value FROM jsonb_array_elements($1::jsonb)")
            .bind(batch)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
