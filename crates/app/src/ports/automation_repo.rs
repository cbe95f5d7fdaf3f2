//! Automation repository port: persistence for automations.

use std::future::Future;

use crmflow_domain::automation::{Automation, AutomationStatus};
use crmflow_domain::error::CrmFlowError;
use crmflow_domain::id::AutomationId;
use crmflow_domain::time::Timestamp;
use crmflow_domain::trigger::TriggerKind;

/// Repository for persisting and querying [`Automation`]s.
pub trait AutomationRepository {
    /// Create a new automation in storage.
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, CrmFlowError>> + Send;

    /// Get an automation by its unique identifier.
    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, CrmFlowError>> + Send;

    /// Get all automations.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, CrmFlowError>> + Send;

    /// Get active automations, optionally restricted to one trigger kind.
    fn list_active(
        &self,
        trigger: Option<TriggerKind>,
    ) -> impl Future<Output = Result<Vec<Automation>, CrmFlowError>> + Send;

    /// Replace the user-editable fields of an existing automation.
    ///
    /// `execution_count` and `last_run_at` are left untouched.
    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, CrmFlowError>> + Send;

    /// Toggle an automation between active and paused.
    fn set_status(
        &self,
        id: AutomationId,
        status: AutomationStatus,
    ) -> impl Future<Output = Result<Automation, CrmFlowError>> + Send;

    /// Delete an automation by its unique identifier.
    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), CrmFlowError>> + Send;

    /// Add `successes` to the execution count and set `last_run_at`.
    ///
    /// Must be applied atomically per automation.
    fn record_run(
        &self,
        id: AutomationId,
        successes: u64,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), CrmFlowError>> + Send;
}

impl<T: AutomationRepository + Send + Sync> AutomationRepository for std::sync::Arc<T> {
    fn create(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, CrmFlowError>> + Send {
        (**self).create(automation)
    }

    fn get_by_id(
        &self,
        id: AutomationId,
    ) -> impl Future<Output = Result<Option<Automation>, CrmFlowError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Automation>, CrmFlowError>> + Send {
        (**self).get_all()
    }

    fn list_active(
        &self,
        trigger: Option<TriggerKind>,
    ) -> impl Future<Output = Result<Vec<Automation>, CrmFlowError>> + Send {
        (**self).list_active(trigger)
    }

    fn update(
        &self,
        automation: Automation,
    ) -> impl Future<Output = Result<Automation, CrmFlowError>> + Send {
        (**self).update(automation)
    }

    fn set_status(
        &self,
        id: AutomationId,
        status: AutomationStatus,
    ) -> impl Future<Output = Result<Automation, CrmFlowError>> + Send {
        (**self).set_status(id, status)
    }

    fn delete(&self, id: AutomationId) -> impl Future<Output = Result<(), CrmFlowError>> + Send {
        (**self).delete(id)
    }

    fn record_run(
        &self,
        id: AutomationId,
        successes: u64,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), CrmFlowError>> + Send {
        (**self).record_run(id, successes, at)
    }
}
