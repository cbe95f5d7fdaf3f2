//! Automation: a stored binding of a trigger, a target group and an action.
//!
//! `execution_count` and `last_run_at` are owned by the execution
//! orchestrator; every other field is user-editable. Toggling
//! [`AutomationStatus`] and deletion are the only lifecycle transitions.

use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, ActionParams};
use crate::error::{CrmFlowError, ValidationError};
use crate::id::AutomationId;
use crate::target_group::TargetGroup;
use crate::time::Timestamp;
use crate::trigger::TriggerKind;

/// Whether the dispatchers may select the automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationStatus {
    #[default]
    Active,
    Paused,
}

impl AutomationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }
}

impl std::str::FromStr for AutomationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            _ => Err(ValidationError::InvalidStatus),
        }
    }
}

/// A rule that performs an action for every contact of a target group
/// whenever its trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    pub description: String,
    pub trigger: TriggerKind,
    pub action: ActionKind,
    /// Message with `{name}` / `{company}` placeholders.
    pub message_template: String,
    /// Overrides the globally configured endpoint for webhook actions.
    pub webhook_endpoint: Option<String>,
    pub target_group: TargetGroup,
    pub status: AutomationStatus,
    pub execution_count: u64,
    pub last_run_at: Option<Timestamp>,
    /// Delay for `time_based` triggers; 24 hours when unset.
    pub delay_minutes: Option<u32>,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AutomationStatus::Active
    }

    /// Parameters forwarded to the action dispatcher.
    #[must_use]
    pub fn action_params(&self) -> ActionParams {
        let message = self.message_template.trim();
        ActionParams {
            message: (!message.is_empty()).then(|| self.message_template.clone()),
            webhook_endpoint: self
                .webhook_endpoint
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(ToString::to_string),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `webhook_endpoint` is set but not an http(s) URL ([`ValidationError::InvalidEndpoint`])
    /// - `delay_minutes` is zero ([`ValidationError::ZeroDelay`])
    pub fn validate(&self) -> Result<(), CrmFlowError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(endpoint) = self.webhook_endpoint.as_deref().map(str::trim) {
            if !endpoint.is_empty() && !is_http_url(endpoint) {
                return Err(ValidationError::InvalidEndpoint.into());
            }
        }
        if self.delay_minutes == Some(0) {
            return Err(ValidationError::ZeroDelay.into());
        }
        Ok(())
    }
}

/// Whether `value` looks like an absolute http(s) URL with a host.
#[must_use]
pub fn is_http_url(value: &str) -> bool {
    ["https://", "http://"].iter().any(|scheme| {
        value
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
    })
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    name: Option<String>,
    description: Option<String>,
    trigger: Option<TriggerKind>,
    action: Option<ActionKind>,
    message_template: Option<String>,
    webhook_endpoint: Option<String>,
    target_group: Option<TargetGroup>,
    status: Option<AutomationStatus>,
    execution_count: u64,
    last_run_at: Option<Timestamp>,
    delay_minutes: Option<u32>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionKind) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn webhook_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.webhook_endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn target_group(mut self, group: TargetGroup) -> Self {
        self.target_group = Some(group);
        self
    }

    #[must_use]
    pub fn status(mut self, status: AutomationStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn execution_count(mut self, count: u64) -> Self {
        self.execution_count = count;
        self
    }

    #[must_use]
    pub fn last_run_at(mut self, ts: Timestamp) -> Self {
        self.last_run_at = Some(ts);
        self
    }

    #[must_use]
    pub fn delay_minutes(mut self, minutes: u32) -> Self {
        self.delay_minutes = Some(minutes);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// Defaults: `new_lead` trigger, `add_note` action, `all` target group,
    /// active status.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::Validation`] if invariants fail.
    pub fn build(self) -> Result<Automation, CrmFlowError> {
        let automation = Automation {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            trigger: self.trigger.unwrap_or(TriggerKind::NewLead),
            action: self
                .action
                .unwrap_or(ActionKind::Local(crate::action::LocalAction::AddNote)),
            message_template: self.message_template.unwrap_or_default(),
            webhook_endpoint: self.webhook_endpoint,
            target_group: self.target_group.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            execution_count: self.execution_count,
            last_run_at: self.last_run_at,
            delay_minutes: self.delay_minutes,
        };
        automation.validate()?;
        Ok(automation)
    }
}
