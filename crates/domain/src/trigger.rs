//! Trigger: the business-event kind that starts an automation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::target_group::HOT_SCORE;

const INACTIVE_DAYS: f64 = 30.0;

/// Recognized business-event kinds.
///
/// Unknown names are preserved as [`TriggerKind::Unrecognized`]; they never
/// match any event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerKind {
    NewLead,
    HotLead,
    StatusChange,
    LeadInactive,
    DealWon,
    DealLost,
    PaymentReceived,
    PaymentOverdue,
    TaskOverdue,
    FormSubmitted,
    AppointmentScheduled,
    Birthday,
    /// Fires once the configured delay has elapsed since the last run.
    TimeBased,
    /// Fires weekly on the designated weekday.
    WeeklyReport,
    /// Fires on the first day of each month.
    MonthlyBackup,
    Unrecognized(String),
}

impl TriggerKind {
    /// Every recognized trigger, in catalog order.
    pub const KNOWN: [Self; 15] = [
        Self::NewLead,
        Self::HotLead,
        Self::StatusChange,
        Self::LeadInactive,
        Self::DealWon,
        Self::DealLost,
        Self::PaymentReceived,
        Self::PaymentOverdue,
        Self::TaskOverdue,
        Self::FormSubmitted,
        Self::AppointmentScheduled,
        Self::Birthday,
        Self::TimeBased,
        Self::WeeklyReport,
        Self::MonthlyBackup,
    ];

    /// Canonical name of the trigger.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewLead => "new_lead",
            Self::HotLead => "hot_lead",
            Self::StatusChange => "status_change",
            Self::LeadInactive => "lead_inactive",
            Self::DealWon => "deal_won",
            Self::DealLost => "deal_lost",
            Self::PaymentReceived => "payment_received",
            Self::PaymentOverdue => "payment_overdue",
            Self::TaskOverdue => "task_overdue",
            Self::FormSubmitted => "form_submitted",
            Self::AppointmentScheduled => "appointment_scheduled",
            Self::Birthday => "birthday",
            Self::TimeBased => "time_based",
            Self::WeeklyReport => "weekly_report",
            Self::MonthlyBackup => "monthly_backup",
            Self::Unrecognized(name) => name,
        }
    }

    /// Human-readable description shown in the catalog.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NewLead => "A new lead was registered",
            Self::HotLead => "A lead reached a score of 80 or more",
            Self::StatusChange => "A lead moved to another pipeline status",
            Self::LeadInactive => "A lead has not been contacted for 30 days",
            Self::DealWon => "A deal was closed as won",
            Self::DealLost => "A deal was closed as lost",
            Self::PaymentReceived => "A payment was confirmed",
            Self::PaymentOverdue => "A payment is past its due date",
            Self::TaskOverdue => "A task is past its due date",
            Self::FormSubmitted => "A capture form was submitted",
            Self::AppointmentScheduled => "A meeting was booked",
            Self::Birthday => "It is the contact's birthday",
            Self::TimeBased => "Runs after a configured delay",
            Self::WeeklyReport => "Runs once a week",
            Self::MonthlyBackup => "Runs on the first day of each month",
            Self::Unrecognized(_) => "Unrecognized trigger",
        }
    }

    /// Whether this trigger is driven by the scheduler rather than by events.
    #[must_use]
    pub fn is_time_based(&self) -> bool {
        matches!(
            self,
            Self::TimeBased | Self::WeeklyReport | Self::MonthlyBackup
        )
    }

    /// Decide whether `event` satisfies this trigger.
    ///
    /// Pure and total: time-based and unrecognized kinds never match.
    /// The event's own `kind` is not consulted; callers select candidate
    /// automations by kind first.
    #[must_use]
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        match self {
            Self::NewLead => event.non_empty_str("contact_id"),
            Self::HotLead => event.number("score").is_some_and(|s| s >= f64::from(HOT_SCORE)),
            Self::StatusChange => match (event.str("from"), event.str("to")) {
                (Some(from), Some(to)) => from != to,
                _ => false,
            },
            Self::LeadInactive => event
                .number("days_without_contact")
                .is_some_and(|days| days >= INACTIVE_DAYS),
            Self::DealWon => event.str("status") == Some("won"),
            Self::DealLost => event.str("status") == Some("lost"),
            Self::PaymentReceived => event.number("amount").is_some_and(|a| a > 0.0),
            Self::PaymentOverdue => event.number("days_overdue").is_some_and(|d| d >= 1.0),
            Self::TaskOverdue => event.flag("overdue"),
            Self::FormSubmitted => event.non_empty_str("form_id"),
            Self::AppointmentScheduled => event
                .str("starts_at")
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            Self::Birthday => event.flag("is_birthday"),
            Self::TimeBased | Self::WeeklyReport | Self::MonthlyBackup | Self::Unrecognized(_) => {
                false
            }
        }
    }
}

impl FromStr for TriggerKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Ok(Self::KNOWN
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or_else(|| Self::Unrecognized(name.to_string())))
    }
}

impl From<String> for TriggerKind {
    fn from(value: String) -> Self {
        let Ok(kind) = value.parse::<Self>();
        kind
    }
}

impl From<TriggerKind> for String {
    fn from(value: TriggerKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ephemeral business event handed to the event dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub kind: TriggerKind,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl TriggerEvent {
    /// Create an event from a JSON object; non-object values yield no fields.
    #[must_use]
    pub fn new(kind: TriggerKind, fields: serde_json::Value) -> Self {
        let fields = match fields {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self { kind, fields }
    }

    /// String field, if present.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(serde_json::Value::as_str)
    }

    /// Numeric field, accepting JSON numbers and numeric strings.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.fields
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    fn non_empty_str(&self, key: &str) -> bool {
        self.str(key).is_some_and(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: TriggerKind, fields: serde_json::Value) -> TriggerEvent {
        TriggerEvent::new(kind, fields)
    }

    #[test]
    fn should_match_hot_lead_at_threshold() {
        let kind = TriggerKind::HotLead;
        assert!(kind.matches(&event(kind.clone(), serde_json::json!({"score": 80}))));
        assert!(kind.matches(&event(kind.clone(), serde_json::json!({"score": "95"}))));
        assert!(!kind.matches(&event(kind.clone(), serde_json::json!({"score": 79}))));
        assert!(!kind.matches(&event(kind.clone(), serde_json::json!({}))));
    }

    #[test]
    fn should_match_status_change_only_when_status_differs() {
        let kind = TriggerKind::StatusChange;
        let moved = event(kind.clone(), serde_json::json!({"from": "new", "to": "qualified"}));
        let same = event(kind.clone(), serde_json::json!({"from": "new", "to": "new"}));
        let partial = event(kind.clone(), serde_json::json!({"to": "new"}));
        assert!(kind.matches(&moved));
        assert!(!kind.matches(&same));
        assert!(!kind.matches(&partial));
    }

    #[test]
    fn should_match_deal_outcomes_on_status_field() {
        let won = event(TriggerKind::DealWon, serde_json::json!({"status": "won"}));
        assert!(TriggerKind::DealWon.matches(&won));
        assert!(!TriggerKind::DealLost.matches(&won));
    }

    #[test]
    fn should_match_numeric_thresholds() {
        let inactive = event(
            TriggerKind::LeadInactive,
            serde_json::json!({"days_without_contact": 30}),
        );
        assert!(TriggerKind::LeadInactive.matches(&inactive));

        let paid = event(TriggerKind::PaymentReceived, serde_json::json!({"amount": 0}));
        assert!(!TriggerKind::PaymentReceived.matches(&paid));

        let overdue = event(TriggerKind::PaymentOverdue, serde_json::json!({"days_overdue": 2}));
        assert!(TriggerKind::PaymentOverdue.matches(&overdue));
    }

    #[test]
    fn should_match_boolean_flags() {
        let task = event(TriggerKind::TaskOverdue, serde_json::json!({"overdue": true}));
        assert!(TriggerKind::TaskOverdue.matches(&task));
        let bday = event(TriggerKind::Birthday, serde_json::json!({"is_birthday": "yes"}));
        assert!(!TriggerKind::Birthday.matches(&bday));
    }

    #[test]
    fn should_require_valid_appointment_timestamp() {
        let ok = event(
            TriggerKind::AppointmentScheduled,
            serde_json::json!({"starts_at": "2026-10-20T14:00:00Z"}),
        );
        let bad = event(
            TriggerKind::AppointmentScheduled,
            serde_json::json!({"starts_at": "tomorrow"}),
        );
        assert!(TriggerKind::AppointmentScheduled.matches(&ok));
        assert!(!TriggerKind::AppointmentScheduled.matches(&bad));
    }

    #[test]
    fn should_never_match_time_based_triggers_against_events() {
        let e = event(TriggerKind::TimeBased, serde_json::json!({"score": 100}));
        for kind in [
            TriggerKind::TimeBased,
            TriggerKind::WeeklyReport,
            TriggerKind::MonthlyBackup,
        ] {
            assert!(kind.is_time_based());
            assert!(!kind.matches(&e));
        }
    }

    #[test]
    fn should_never_match_unrecognized_trigger() {
        let kind: TriggerKind = "lunar_eclipse".parse().unwrap();
        assert_eq!(kind, TriggerKind::Unrecognized("lunar_eclipse".to_string()));
        assert!(!kind.matches(&event(kind.clone(), serde_json::json!({"score": 99}))));
    }

    #[test]
    fn should_give_identical_answers_on_repeated_calls() {
        let e = event(
            TriggerKind::NewLead,
            serde_json::json!({"contact_id": "c-1", "score": 90, "overdue": true}),
        );
        let before = e.clone();
        for kind in TriggerKind::KNOWN {
            let first = kind.matches(&e);
            for _ in 0..3 {
                assert_eq!(kind.matches(&e), first);
            }
        }
        assert_eq!(e, before);
    }

    #[test]
    fn should_roundtrip_every_known_name() {
        for kind in TriggerKind::KNOWN {
            let parsed: TriggerKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn should_ignore_non_object_event_payload() {
        let e = TriggerEvent::new(TriggerKind::NewLead, serde_json::json!([1, 2, 3]));
        assert!(e.fields.is_empty());
        assert!(!TriggerKind::NewLead.matches(&e));
    }

    #[test]
    fn should_deserialize_event_from_json() {
        let e: TriggerEvent =
            serde_json::from_value(serde_json::json!({"kind": "hot_lead", "fields": {"score": 91}}))
                .unwrap();
        assert_eq!(e.kind, TriggerKind::HotLead);
        assert!(TriggerKind::HotLead.matches(&e));
    }
}
