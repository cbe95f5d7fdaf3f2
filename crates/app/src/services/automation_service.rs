//! Automation service: use-cases for managing automations.

use crmflow_domain::automation::{Automation, AutomationStatus};
use crmflow_domain::error::{CrmFlowError, NotFoundError};
use crmflow_domain::execution::ExecutionRecord;
use crmflow_domain::id::AutomationId;

use crate::ports::{AutomationRepository, ExecutionLog};

/// Upper bound on the number of history records returned at once.
pub const MAX_HISTORY: usize = 500;

/// Application service for automation management and run history.
pub struct AutomationService<R, L> {
    repo: R,
    log: L,
}

impl<R: AutomationRepository, L: ExecutionLog> AutomationService<R, L> {
    /// Create a new service backed by the given repository and log.
    pub fn new(repo: R, log: L) -> Self {
        Self { repo, log }
    }

    /// Create a new automation after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, automation), fields(automation_name = %automation.name))]
    pub async fn create_automation(
        &self,
        automation: Automation,
    ) -> Result<Automation, CrmFlowError> {
        automation.validate()?;
        self.repo.create(automation).await
    }

    /// Look up an automation by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::NotFound`] when no automation with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_automation(&self, id: AutomationId) -> Result<Automation, CrmFlowError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Automation",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all automations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_automations(&self) -> Result<Vec<Automation>, CrmFlowError> {
        self.repo.get_all().await
    }

    /// Update the user-editable fields of an existing automation.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::Validation`] if invariants fail,
    /// [`CrmFlowError::NotFound`] if the automation does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, automation), fields(automation_id = %automation.id))]
    pub async fn update_automation(
        &self,
        automation: Automation,
    ) -> Result<Automation, CrmFlowError> {
        automation.validate()?;
        self.get_automation(automation.id).await?;
        self.repo.update(automation).await
    }

    /// Activate or pause an automation.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::NotFound`] if the automation does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: AutomationId,
        status: AutomationStatus,
    ) -> Result<Automation, CrmFlowError> {
        self.get_automation(id).await?;
        self.repo.set_status(id, status).await
    }

    /// Delete an automation by id.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::NotFound`] if the automation does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_automation(&self, id: AutomationId) -> Result<(), CrmFlowError> {
        self.get_automation(id).await?;
        self.repo.delete(id).await
    }

    /// Most recent execution records of an automation, newest first.
    ///
    /// `limit` is capped at [`MAX_HISTORY`].
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::NotFound`] if the automation does not exist,
    /// or a storage error from the log.
    pub async fn history(
        &self,
        id: AutomationId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, CrmFlowError> {
        self.get_automation(id).await?;
        self.log
            .list_for_automation(id, limit.min(MAX_HISTORY))
            .await
    }
}
