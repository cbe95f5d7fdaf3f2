//! Execution records and run summaries.
//!
//! One [`ExecutionRecord`] is appended per action attempt; records are
//! never updated. A [`RunSummary`] is the plain-text report of one
//! automation run handed back to callers.

use serde::{Deserialize, Serialize};

use crate::action::{ActionError, Delivery};
use crate::contact::Contact;
use crate::id::{AutomationId, ContactId, ExecutionId};
use crate::time::Timestamp;

/// Outcome of one action attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(crate::error::ValidationError::InvalidOutcome),
        }
    }
}

/// Immutable log entry for one action attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub automation_id: AutomationId,
    pub contact_id: ContactId,
    pub outcome: Outcome,
    pub timestamp: Timestamp,
    pub error_detail: Option<String>,
}

impl ExecutionRecord {
    #[must_use]
    pub fn success(automation_id: AutomationId, contact_id: ContactId, at: Timestamp) -> Self {
        Self {
            id: ExecutionId::new(),
            automation_id,
            contact_id,
            outcome: Outcome::Success,
            timestamp: at,
            error_detail: None,
        }
    }

    #[must_use]
    pub fn failure(
        automation_id: AutomationId,
        contact_id: ContactId,
        at: Timestamp,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            automation_id,
            contact_id,
            outcome: Outcome::Failed,
            timestamp: at,
            error_detail: Some(detail.into()),
        }
    }
}

/// Per-contact line of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactOutcome {
    pub contact_id: ContactId,
    pub contact_name: String,
    pub outcome: Outcome,
    pub detail: String,
}

impl ContactOutcome {
    #[must_use]
    pub fn from_result(contact: &Contact, result: &Result<Delivery, ActionError>) -> Self {
        let (outcome, detail) = match result {
            Ok(delivery) => (Outcome::Success, delivery.to_string()),
            Err(err) => (Outcome::Failed, error_chain(err)),
        };
        Self {
            contact_id: contact.id,
            contact_name: contact.name.clone(),
            outcome,
            detail,
        }
    }
}

/// Report of one automation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub automation_id: AutomationId,
    pub attempted: usize,
    pub succeeded: usize,
    pub details: Vec<ContactOutcome>,
    /// Set when the run could not start (the contact set failed to load).
    pub aborted: Option<String>,
    /// Set when a stop signal interrupted the run between contacts.
    pub cancelled: bool,
}

impl RunSummary {
    /// Summary of a run that attempted nothing.
    #[must_use]
    pub fn empty(automation_id: AutomationId) -> Self {
        Self {
            automation_id,
            attempted: 0,
            succeeded: 0,
            details: Vec::new(),
            aborted: None,
            cancelled: false,
        }
    }

    /// Zero-success summary for a run whose contact set failed to resolve.
    #[must_use]
    pub fn aborted(automation_id: AutomationId, reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Self::empty(automation_id)
        }
    }

    /// Account for one attempted contact.
    pub fn push(&mut self, line: ContactOutcome) {
        self.attempted += 1;
        if line.outcome == Outcome::Success {
            self.succeeded += 1;
        }
        self.details.push(line);
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Render an error and its sources as `outer: inner: root`.
#[must_use]
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
