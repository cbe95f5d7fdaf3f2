//! Execution log port: append-only outcome records.

use std::future::Future;

use crmflow_domain::error::CrmFlowError;
use crmflow_domain::execution::ExecutionRecord;
use crmflow_domain::id::AutomationId;

/// Append-only store of [`ExecutionRecord`]s.
pub trait ExecutionLog {
    /// Persist one record. Records are never updated afterwards.
    fn append(
        &self,
        record: ExecutionRecord,
    ) -> impl Future<Output = Result<(), CrmFlowError>> + Send;

    /// Most recent records of an automation, newest first.
    fn list_for_automation(
        &self,
        automation_id: AutomationId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ExecutionRecord>, CrmFlowError>> + Send;
}

impl<T: ExecutionLog + Send + Sync> ExecutionLog for std::sync::Arc<T> {
    fn append(
        &self,
        record: ExecutionRecord,
    ) -> impl Future<Output = Result<(), CrmFlowError>> + Send {
        (**self).append(record)
    }

    fn list_for_automation(
        &self,
        automation_id: AutomationId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ExecutionRecord>, CrmFlowError>> + Send {
        (**self).list_for_automation(automation_id, limit)
    }
}
