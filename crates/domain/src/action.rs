//! Action: the side effect an automation performs once per contact.
//!
//! Action kinds are grouped by execution shape:
//! - [`DirectAction`] opens a messaging channel composer for the contact
//! - [`WebhookAction`] posts a JSON envelope to an integration endpoint
//! - [`LocalAction`] performs bounded local work without any network call

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side-effect kind, grouped by execution shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Direct(DirectAction),
    Webhook(WebhookAction),
    Local(LocalAction),
    /// A name that matches no known action; executing it always fails.
    Unrecognized(String),
}

/// Messaging channel a direct action opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    WhatsApp,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhatsApp => f.write_str("whatsapp"),
            Self::Email => f.write_str("email"),
        }
    }
}

/// Actions handed to a channel opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectAction {
    SendWhatsapp,
    WhatsappFollowUp,
    SendEmail,
    SendWelcomeEmail,
}

impl DirectAction {
    const ALL: [Self; 4] = [
        Self::SendWhatsapp,
        Self::WhatsappFollowUp,
        Self::SendEmail,
        Self::SendWelcomeEmail,
    ];

    #[must_use]
    pub fn channel(self) -> Channel {
        match self {
            Self::SendWhatsapp | Self::WhatsappFollowUp => Channel::WhatsApp,
            Self::SendEmail | Self::SendWelcomeEmail => Channel::Email,
        }
    }

    /// Message used when the automation has no template.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::SendWhatsapp => "Hello {name}, how can we help you today?",
            Self::WhatsappFollowUp => {
                "Hi {name}, just following up on our last conversation. Any questions?"
            }
            Self::SendEmail => "Hello {name},\n\nWe would love to hear from you.",
            Self::SendWelcomeEmail => {
                "Welcome {name}!\n\nThanks for your interest. We are glad to have {company} with us."
            }
        }
    }

    /// Email subject line; empty for non-email channels.
    #[must_use]
    pub fn subject(self) -> &'static str {
        match self {
            Self::SendEmail => "A message for {name}",
            Self::SendWelcomeEmail => "Welcome, {name}!",
            Self::SendWhatsapp | Self::WhatsappFollowUp => "",
        }
    }
}

/// Actions delivered as a JSON POST to an integration endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookAction {
    Zapier,
    Make,
    N8n,
    Pabbly,
    HubSpot,
    Pipedrive,
    RdStation,
    Salesforce,
    DocuSign,
    Slack,
    GoogleSheets,
}

impl WebhookAction {
    const ALL: [Self; 11] = [
        Self::Zapier,
        Self::Make,
        Self::N8n,
        Self::Pabbly,
        Self::HubSpot,
        Self::Pipedrive,
        Self::RdStation,
        Self::Salesforce,
        Self::DocuSign,
        Self::Slack,
        Self::GoogleSheets,
    ];

    /// Platform tag, also the key for globally configured endpoints.
    #[must_use]
    pub fn platform(self) -> &'static str {
        match self {
            Self::Zapier => "zapier",
            Self::Make => "make",
            Self::N8n => "n8n",
            Self::Pabbly => "pabbly",
            Self::HubSpot => "hubspot",
            Self::Pipedrive => "pipedrive",
            Self::RdStation => "rdstation",
            Self::Salesforce => "salesforce",
            Self::DocuSign => "docusign",
            Self::Slack => "slack",
            Self::GoogleSheets => "google_sheets",
        }
    }
}

/// Bounded local work, no network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalAction {
    AssignUser,
    GenerateBoleto,
    BackupData,
    /// Appends the rendered message to the contact's notes.
    AddNote,
    /// Appends an activity line to the contact's notes.
    LogActivity,
}

impl LocalAction {
    const ALL: [Self; 5] = [
        Self::AssignUser,
        Self::GenerateBoleto,
        Self::BackupData,
        Self::AddNote,
        Self::LogActivity,
    ];

    /// Whether the action writes an audit note to the contact.
    #[must_use]
    pub fn writes_note(self) -> bool {
        matches!(self, Self::AddNote | Self::LogActivity)
    }
}

impl ActionKind {
    /// Every recognized action, in catalog order.
    #[must_use]
    pub fn known() -> Vec<Self> {
        DirectAction::ALL
            .into_iter()
            .map(Self::Direct)
            .chain(WebhookAction::ALL.into_iter().map(Self::Webhook))
            .chain(LocalAction::ALL.into_iter().map(Self::Local))
            .collect()
    }

    /// Canonical name of the action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Direct(action) => match action {
                DirectAction::SendWhatsapp => "send_whatsapp",
                DirectAction::WhatsappFollowUp => "whatsapp_follow_up",
                DirectAction::SendEmail => "send_email",
                DirectAction::SendWelcomeEmail => "send_welcome_email",
            },
            Self::Webhook(action) => match action {
                WebhookAction::Zapier => "zapier_webhook",
                WebhookAction::Make => "make_webhook",
                WebhookAction::N8n => "n8n_webhook",
                WebhookAction::Pabbly => "pabbly_webhook",
                WebhookAction::HubSpot => "hubspot_sync",
                WebhookAction::Pipedrive => "pipedrive_sync",
                WebhookAction::RdStation => "rdstation_sync",
                WebhookAction::Salesforce => "salesforce_sync",
                WebhookAction::DocuSign => "docusign_send",
                WebhookAction::Slack => "slack_notify",
                WebhookAction::GoogleSheets => "google_sheets_append",
            },
            Self::Local(action) => match action {
                LocalAction::AssignUser => "assign_user",
                LocalAction::GenerateBoleto => "generate_boleto",
                LocalAction::BackupData => "backup_data",
                LocalAction::AddNote => "add_note",
                LocalAction::LogActivity => "log_activity",
            },
            Self::Unrecognized(name) => name,
        }
    }

    /// Human-readable description shown in the catalog.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Direct(DirectAction::SendWhatsapp) => "Open a WhatsApp conversation with a message",
            Self::Direct(DirectAction::WhatsappFollowUp) => "Send a WhatsApp follow-up message",
            Self::Direct(DirectAction::SendEmail) => "Compose an email to the contact",
            Self::Direct(DirectAction::SendWelcomeEmail) => "Compose a welcome email",
            Self::Webhook(WebhookAction::Zapier) => "Post the contact to a Zapier webhook",
            Self::Webhook(WebhookAction::Make) => "Post the contact to a Make scenario",
            Self::Webhook(WebhookAction::N8n) => "Post the contact to an n8n workflow",
            Self::Webhook(WebhookAction::Pabbly) => "Post the contact to Pabbly Connect",
            Self::Webhook(WebhookAction::HubSpot) => "Sync the contact to HubSpot",
            Self::Webhook(WebhookAction::Pipedrive) => "Sync the contact to Pipedrive",
            Self::Webhook(WebhookAction::RdStation) => "Sync the contact to RD Station",
            Self::Webhook(WebhookAction::Salesforce) => "Sync the contact to Salesforce",
            Self::Webhook(WebhookAction::DocuSign) => "Send a DocuSign envelope request",
            Self::Webhook(WebhookAction::Slack) => "Notify a Slack channel",
            Self::Webhook(WebhookAction::GoogleSheets) => "Append the contact to a Google Sheet",
            Self::Local(LocalAction::AssignUser) => "Assign the contact to a sales rep",
            Self::Local(LocalAction::GenerateBoleto) => "Generate a boleto payment reference",
            Self::Local(LocalAction::BackupData) => "Snapshot the contact data",
            Self::Local(LocalAction::AddNote) => "Add a note to the contact",
            Self::Local(LocalAction::LogActivity) => "Log an activity on the contact",
            Self::Unrecognized(_) => "Unrecognized action",
        }
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Ok(Self::known()
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or_else(|| Self::Unrecognized(name.to_string())))
    }
}

impl From<String> for ActionKind {
    fn from(value: String) -> Self {
        let Ok(kind) = value.parse::<Self>();
        kind
    }
}

impl From<ActionKind> for String {
    fn from(value: ActionKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-automation parameters handed to the action dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionParams {
    pub message: Option<String>,
    pub webhook_endpoint: Option<String>,
}

/// What a successful action did, for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A channel composer was opened.
    Opened { channel: Channel, recipient: String },
    /// The webhook envelope was posted.
    Posted { platform: &'static str, endpoint: String },
    /// Local work completed.
    Local { summary: String },
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { channel, recipient } => write!(f, "{channel} opened for {recipient}"),
            Self::Posted { platform, endpoint } => {
                write!(f, "posted to {platform} ({})", endpoint_origin(endpoint))
            }
            Self::Local { summary } => f.write_str(summary),
        }
    }
}

/// Failure of one action attempt against one contact.
///
/// Always local to that contact; a run continues with the next one.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("contact has no {0} identifier")]
    MissingChannel(Channel),

    #[error("no endpoint configured for {platform}")]
    MissingEndpoint { platform: &'static str },

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("unsupported action {0}")]
    UnsupportedAction(String),

    #[error("local write failed")]
    LocalWrite(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Outbound delivery failed (transport error, timeout, rejected response).
///
/// Displays only the origin of a URL target; hook paths often embed secrets.
#[derive(Debug, thiserror::Error)]
#[error("delivery to {} failed", endpoint_origin(.target))]
pub struct DeliveryError {
    pub target: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl DeliveryError {
    pub fn new(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

/// Scheme and host of a URL, without credentials, path or query.
///
/// Anything that is not a URL is returned unchanged.
#[must_use]
pub fn endpoint_origin(endpoint: &str) -> String {
    let Some((scheme, rest)) = endpoint.split_once("://") else {
        return endpoint.to_string();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    format!("{scheme}://{host}")
}
