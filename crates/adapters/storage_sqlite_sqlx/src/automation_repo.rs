//! `SQLite` implementation of [`AutomationRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crmflow_app::ports::AutomationRepository;
use crmflow_domain::automation::{Automation, AutomationStatus};
use crmflow_domain::error::{CrmFlowError, NotFoundError};
use crmflow_domain::id::AutomationId;
use crmflow_domain::time::Timestamp;
use crmflow_domain::trigger::TriggerKind;

use crate::codec::{decode, decode_opt_ts, encode_ts, narrow};
use crate::error::StorageError;

struct Wrapper(Automation);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Automation> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let trigger: String = row.try_get("trigger_kind")?;
        let action: String = row.try_get("action_kind")?;
        let target_group: String = row.try_get("target_group")?;
        let status: String = row.try_get("status")?;
        let execution_count: i64 = row.try_get("execution_count")?;
        let last_run_at: Option<String> = row.try_get("last_run_at")?;
        let delay_minutes: Option<i64> = row.try_get("delay_minutes")?;

        Ok(Self(Automation {
            id: decode(&id)?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            trigger: decode(&trigger)?,
            action: decode(&action)?,
            message_template: row.try_get("message_template")?,
            webhook_endpoint: row.try_get("webhook_endpoint")?,
            target_group: decode(&target_group)?,
            status: decode(&status)?,
            execution_count: narrow(execution_count)?,
            last_run_at: decode_opt_ts(last_run_at)?,
            delay_minutes: delay_minutes.map(narrow).transpose()?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO automations (
        id, name, description, trigger_kind, action_kind, message_template,
        webhook_endpoint, target_group, status, execution_count, last_run_at, delay_minutes
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE: &str = r"
    UPDATE automations SET
        name = ?, description = ?, trigger_kind = ?, action_kind = ?, message_template = ?,
        webhook_endpoint = ?, target_group = ?, status = ?, delay_minutes = ?
    WHERE id = ?
";

const RECORD_RUN: &str = r"
    UPDATE automations
    SET execution_count = execution_count + ?, last_run_at = ?
    WHERE id = ?
";

const SELECT_BY_ID: &str = "SELECT * FROM automations WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM automations ORDER BY name, id";
const SELECT_ACTIVE: &str = r"
    SELECT * FROM automations
    WHERE status = 'active' AND (?1 IS NULL OR trigger_kind = ?1)
    ORDER BY name, id
";
const SET_STATUS: &str = "UPDATE automations SET status = ? WHERE id = ?";
const DELETE: &str = "DELETE FROM automations WHERE id = ?";

fn not_found(id: AutomationId) -> CrmFlowError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed automation repository.
pub struct SqliteAutomationRepository {
    pool: SqlitePool,
}

impl SqliteAutomationRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: AutomationId) -> Result<Automation, CrmFlowError> {
        self.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }
}

impl AutomationRepository for SqliteAutomationRepository {
    async fn create(&self, automation: Automation) -> Result<Automation, CrmFlowError> {
        let execution_count = i64::try_from(automation.execution_count).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(automation.id.to_string())
            .bind(&automation.name)
            .bind(&automation.description)
            .bind(automation.trigger.as_str())
            .bind(automation.action.as_str())
            .bind(&automation.message_template)
            .bind(&automation.webhook_endpoint)
            .bind(automation.target_group.as_str())
            .bind(automation.status.as_str())
            .bind(execution_count)
            .bind(automation.last_run_at.map(encode_ts))
            .bind(automation.delay_minutes.map(i64::from))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(automation)
    }

    async fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, CrmFlowError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Automation>, CrmFlowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn list_active(
        &self,
        trigger: Option<TriggerKind>,
    ) -> Result<Vec<Automation>, CrmFlowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ACTIVE)
            .bind(trigger.as_ref().map(TriggerKind::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, automation: Automation) -> Result<Automation, CrmFlowError> {
        let result = sqlx::query(UPDATE)
            .bind(&automation.name)
            .bind(&automation.description)
            .bind(automation.trigger.as_str())
            .bind(automation.action.as_str())
            .bind(&automation.message_template)
            .bind(&automation.webhook_endpoint)
            .bind(automation.target_group.as_str())
            .bind(automation.status.as_str())
            .bind(automation.delay_minutes.map(i64::from))
            .bind(automation.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(automation.id));
        }
        self.fetch(automation.id).await
    }

    async fn set_status(
        &self,
        id: AutomationId,
        status: AutomationStatus,
    ) -> Result<Automation, CrmFlowError> {
        let result = sqlx::query(SET_STATUS)
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        self.fetch(id).await
    }

    async fn delete(&self, id: AutomationId) -> Result<(), CrmFlowError> {
        sqlx::query(DELETE)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn record_run(
        &self,
        id: AutomationId,
        successes: u64,
        at: Timestamp,
    ) -> Result<(), CrmFlowError> {
        let successes = i64::try_from(successes).map_err(StorageError::from)?;
        let result = sqlx::query(RECORD_RUN)
            .bind(successes)
            .bind(encode_ts(at))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
