//! In-memory port fakes shared by the use-case tests.

use std::collections::HashSet;
use std::sync::Mutex;

use crmflow_domain::action::DeliveryError;
use crmflow_domain::automation::{Automation, AutomationStatus};
use crmflow_domain::contact::Contact;
use crmflow_domain::error::{CrmFlowError, NotFoundError};
use crmflow_domain::execution::ExecutionRecord;
use crmflow_domain::id::{AutomationId, ContactId};
use crmflow_domain::time::Timestamp;
use crmflow_domain::trigger::TriggerKind;

use crate::ports::{
    AutomationRepository, ChannelOpener, Clock, ContactFilter, ContactRepository, ExecutionLog,
    WebhookSender,
};

fn not_found(id: AutomationId) -> CrmFlowError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}

// ── Automations ────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAutomationRepo {
    store: Mutex<Vec<Automation>>,
}

impl InMemoryAutomationRepo {
    pub fn with(automations: Vec<Automation>) -> Self {
        Self {
            store: Mutex::new(automations),
        }
    }

    pub fn snapshot(&self, id: AutomationId) -> Automation {
        self.store
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .unwrap()
    }
}

impl AutomationRepository for InMemoryAutomationRepo {
    async fn create(&self, automation: Automation) -> Result<Automation, CrmFlowError> {
        self.store.lock().unwrap().push(automation.clone());
        Ok(automation)
    }

    async fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, CrmFlowError> {
        Ok(self.store.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Automation>, CrmFlowError> {
        Ok(self.store.lock().unwrap().clone())
    }

    async fn list_active(
        &self,
        trigger: Option<TriggerKind>,
    ) -> Result<Vec<Automation>, CrmFlowError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| trigger.as_ref().is_none_or(|t| &a.trigger == t))
            .cloned()
            .collect())
    }

    async fn update(&self, automation: Automation) -> Result<Automation, CrmFlowError> {
        let mut store = self.store.lock().unwrap();
        let slot = store
            .iter_mut()
            .find(|a| a.id == automation.id)
            .ok_or_else(|| not_found(automation.id))?;
        let kept = (slot.execution_count, slot.last_run_at);
        *slot = automation;
        (slot.execution_count, slot.last_run_at) = kept;
        Ok(slot.clone())
    }

    async fn set_status(
        &self,
        id: AutomationId,
        status: AutomationStatus,
    ) -> Result<Automation, CrmFlowError> {
        let mut store = self.store.lock().unwrap();
        let slot = store
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;
        slot.status = status;
        Ok(slot.clone())
    }

    async fn delete(&self, id: AutomationId) -> Result<(), CrmFlowError> {
        self.store.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn record_run(
        &self,
        id: AutomationId,
        successes: u64,
        at: Timestamp,
    ) -> Result<(), CrmFlowError> {
        let mut store = self.store.lock().unwrap();
        let slot = store
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;
        slot.execution_count += successes;
        slot.last_run_at = Some(at);
        Ok(())
    }
}

// ── Contacts ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryContactRepo {
    contacts: Vec<Contact>,
    pub notes: Mutex<Vec<(ContactId, String)>>,
    unavailable: bool,
    reject_notes: bool,
}

impl InMemoryContactRepo {
    pub fn with(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            ..Self::default()
        }
    }

    /// Every listing fails with a storage error.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Notes cannot be written.
    pub fn rejecting_notes() -> Self {
        Self {
            reject_notes: true,
            ..Self::default()
        }
    }
}

impl ContactRepository for InMemoryContactRepo {
    async fn list(&self, filter: ContactFilter) -> Result<Vec<Contact>, CrmFlowError> {
        if self.unavailable {
            return Err(CrmFlowError::Storage("contacts unavailable".into()));
        }
        Ok(self
            .contacts
            .iter()
            .filter(|c| match filter {
                ContactFilter::All => true,
                ContactFilter::Only(id) => c.id == id,
            })
            .cloned()
            .collect())
    }

    async fn append_note(&self, id: ContactId, note: String) -> Result<(), CrmFlowError> {
        if self.reject_notes {
            return Err(CrmFlowError::Storage("read-only".into()));
        }
        self.notes.lock().unwrap().push((id, note));
        Ok(())
    }
}

// ── Execution log ──────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryExecutionLog {
    pub records: Mutex<Vec<ExecutionRecord>>,
}

impl InMemoryExecutionLog {
    pub fn all(&self) -> Vec<ExecutionRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl ExecutionLog for InMemoryExecutionLog {
    async fn append(&self, record: ExecutionRecord) -> Result<(), CrmFlowError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn list_for_automation(
        &self,
        automation_id: AutomationId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, CrmFlowError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.automation_id == automation_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ── Outbound ───────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingWebhookSender {
    pub posted: Mutex<Vec<(String, serde_json::Value)>>,
    pub failing: HashSet<String>,
}

impl WebhookSender for RecordingWebhookSender {
    async fn post_json(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        if self.failing.contains(endpoint) {
            return Err(DeliveryError::new(endpoint, "connection refused"));
        }
        self.posted
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub whatsapp: Mutex<Vec<(String, String)>>,
    pub emails: Mutex<Vec<(String, String, String)>>,
}

impl ChannelOpener for RecordingOpener {
    async fn open_whatsapp(&self, number: &str, message: &str) -> Result<(), DeliveryError> {
        self.whatsapp
            .lock()
            .unwrap()
            .push((number.to_string(), message.to_string()));
        Ok(())
    }

    async fn open_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        self.emails.lock().unwrap().push((
            address.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

// ── Clock ──────────────────────────────────────────────────────

pub struct FixedClock(Mutex<Timestamp>);

impl FixedClock {
    pub fn at(ts: Timestamp) -> Self {
        Self(Mutex::new(ts))
    }

    pub fn set(&self, ts: Timestamp) {
        *self.0.lock().unwrap() = ts;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.0.lock().unwrap()
    }
}

