//! Event dispatcher: entry point for business events.
//!
//! Selects the active automations bound to the event's trigger kind, keeps
//! those whose trigger predicate accepts the event and runs each of them.
//! An event carrying a `contact_id` targets that contact only, and nobody
//! when the id is malformed.

use crmflow_domain::automation::Automation;
use crmflow_domain::error::CrmFlowError;
use crmflow_domain::execution::RunSummary;
use crmflow_domain::id::ContactId;
use crmflow_domain::trigger::{TriggerEvent, TriggerKind};

use crate::orchestrator::{AutomationRunner, run_with_contacts};
use crate::ports::{AutomationRepository, ContactFilter, ContactRepository};

pub struct EventDispatcher<AR, CR, R> {
    automations: AR,
    contacts: CR,
    runner: R,
}

impl<AR, CR, R> EventDispatcher<AR, CR, R>
where
    AR: AutomationRepository + Send + Sync,
    CR: ContactRepository + Send + Sync,
    R: AutomationRunner + Send + Sync,
{
    pub fn new(automations: AR, contacts: CR, runner: R) -> Self {
        Self {
            automations,
            contacts,
            runner,
        }
    }

    /// Run every active automation whose trigger accepts `event`.
    ///
    /// Unrecognized event kinds match nothing.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the candidate automations cannot be listed.
    #[tracing::instrument(skip_all, fields(kind = %event.kind))]
    pub async fn dispatch(&self, event: &TriggerEvent) -> Result<Vec<RunSummary>, CrmFlowError> {
        if let TriggerKind::Unrecognized(name) = &event.kind {
            tracing::warn!(kind = %name, "unrecognized trigger, nothing to run");
            return Ok(Vec::new());
        }

        let candidates = self.automations.list_active(Some(event.kind.clone())).await?;
        let filter = contact_filter(event);
        if filter.is_none() {
            tracing::warn!(
                contact_id = ?event.fields.get("contact_id"),
                "malformed contact id, no contact targeted"
            );
        }
        let mut summaries = Vec::new();
        for automation in candidates
            .iter()
            .filter(|a| a.is_active() && a.trigger == event.kind)
        {
            if !automation.trigger.matches(event) {
                tracing::debug!(automation_id = %automation.id, "event does not satisfy trigger");
                continue;
            }
            let summary = match filter {
                Some(filter) => {
                    run_with_contacts(&self.runner, &self.contacts, automation, filter).await
                }
                None => self.runner.run(automation, Vec::new()).await,
            };
            summaries.push(summary);
        }
        tracing::info!(runs = summaries.len(), "event dispatched");
        Ok(summaries)
    }

    /// Run an automation immediately against all contacts, regardless of
    /// its trigger.
    #[tracing::instrument(skip_all, fields(automation_id = %automation.id))]
    pub async fn run_now(&self, automation: &Automation) -> RunSummary {
        run_with_contacts(&self.runner, &self.contacts, automation, ContactFilter::All).await
    }
}

/// Contacts an event targets; `None` when it names a contact that cannot exist.
fn contact_filter(event: &TriggerEvent) -> Option<ContactFilter> {
    match event.fields.get("contact_id") {
        None | Some(serde_json::Value::Null) => Some(ContactFilter::All),
        Some(value) => value
            .as_str()
            .and_then(|id| id.trim().parse::<ContactId>().ok())
            .map(ContactFilter::Only),
    }
}
