//! `SQLite` implementation of [`ExecutionLog`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crmflow_app::ports::ExecutionLog;
use crmflow_domain::error::CrmFlowError;
use crmflow_domain::execution::ExecutionRecord;
use crmflow_domain::id::AutomationId;

use crate::codec::{decode, decode_ts, encode_ts};
use crate::error::StorageError;

struct Wrapper(ExecutionRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let automation_id: String = row.try_get("automation_id")?;
        let contact_id: String = row.try_get("contact_id")?;
        let outcome: String = row.try_get("outcome")?;
        let timestamp: String = row.try_get("timestamp")?;

        Ok(Self(ExecutionRecord {
            id: decode(&id)?,
            automation_id: decode(&automation_id)?,
            contact_id: decode(&contact_id)?,
            outcome: decode(&outcome)?,
            timestamp: decode_ts(&timestamp)?,
            error_detail: row.try_get("error_detail")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO execution_records (id, automation_id, contact_id, outcome, timestamp, error_detail)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_RECENT: &str = r"
    SELECT * FROM execution_records
    WHERE automation_id = ?
    ORDER BY timestamp DESC, rowid DESC
    LIMIT ?
";

/// `SQLite`-backed append-only execution log.
pub struct SqliteExecutionLog {
    pool: SqlitePool,
}

impl SqliteExecutionLog {
    /// Create a new log backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ExecutionLog for SqliteExecutionLog {
    async fn append(&self, record: ExecutionRecord) -> Result<(), CrmFlowError> {
        sqlx::query(INSERT)
            .bind(record.id.to_string())
            .bind(record.automation_id.to_string())
            .bind(record.contact_id.to_string())
            .bind(record.outcome.as_str())
            .bind(encode_ts(record.timestamp))
            .bind(&record.error_detail)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn list_for_automation(
        &self,
        automation_id: AutomationId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, CrmFlowError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(automation_id.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
