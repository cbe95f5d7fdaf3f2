//! Action dispatcher: executes one action kind against one contact.
//!
//! Dispatch is closed over the three execution shapes of [`ActionKind`]:
//! direct-channel actions go through a [`ChannelOpener`], webhook actions
//! through a [`WebhookSender`], and local actions run in-process (the audit
//! kinds write through the [`ContactRepository`]).

use std::collections::HashMap;
use std::future::Future;

use crmflow_domain::action::{
    ActionError, ActionKind, ActionParams, Channel, Delivery, DirectAction, LocalAction,
    WebhookAction,
};
use crmflow_domain::contact::Contact;

use crate::ports::{ChannelOpener, Clock, ContactRepository, WebhookSender};

/// `source` field of every webhook envelope.
pub const WEBHOOK_SOURCE: &str = "CRM_Automation";

/// Executes an action against a single contact.
pub trait ActionExecutor {
    fn execute(
        &self,
        action: &ActionKind,
        contact: &Contact,
        params: &ActionParams,
    ) -> impl Future<Output = Result<Delivery, ActionError>> + Send;
}

impl<T: ActionExecutor + Send + Sync> ActionExecutor for std::sync::Arc<T> {
    fn execute(
        &self,
        action: &ActionKind,
        contact: &Contact,
        params: &ActionParams,
    ) -> impl Future<Output = Result<Delivery, ActionError>> + Send {
        (**self).execute(action, contact, params)
    }
}

/// Globally configured dispatch settings.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Integration endpoints keyed by platform tag (`zapier`, `slack`, …).
    pub endpoints: HashMap<String, String>,
    /// Pool of users `assign_user` picks from.
    pub assignees: Vec<String>,
}

/// Default [`ActionExecutor`] backed by outbound ports.
pub struct ActionDispatcher<CR, CO, WS, CK> {
    contacts: CR,
    opener: CO,
    webhooks: WS,
    clock: CK,
    config: DispatcherConfig,
}

impl<CR, CO, WS, CK> ActionDispatcher<CR, CO, WS, CK>
where
    CR: ContactRepository + Send + Sync,
    CO: ChannelOpener + Send + Sync,
    WS: WebhookSender + Send + Sync,
    CK: Clock + Send + Sync,
{
    pub fn new(contacts: CR, opener: CO, webhooks: WS, clock: CK, config: DispatcherConfig) -> Self {
        Self {
            contacts,
            opener,
            webhooks,
            clock,
            config,
        }
    }

    async fn open_channel(
        &self,
        action: DirectAction,
        contact: &Contact,
        params: &ActionParams,
    ) -> Result<Delivery, ActionError> {
        let template = params
            .message
            .as_deref()
            .unwrap_or_else(|| action.default_message());
        let body = contact.render(template);
        match action.channel() {
            Channel::WhatsApp => {
                let number = contact
                    .messaging_number()
                    .ok_or(ActionError::MissingChannel(Channel::WhatsApp))?;
                self.opener.open_whatsapp(&number, &body).await?;
                Ok(Delivery::Opened {
                    channel: Channel::WhatsApp,
                    recipient: number,
                })
            }
            Channel::Email => {
                let address = contact
                    .email_address()
                    .ok_or(ActionError::MissingChannel(Channel::Email))?;
                let subject = contact.render(action.subject());
                self.opener.open_email(address, &subject, &body).await?;
                Ok(Delivery::Opened {
                    channel: Channel::Email,
                    recipient: address.to_string(),
                })
            }
        }
    }

    /// Endpoint precedence: automation override, then global integration.
    fn endpoint_for(&self, hook: WebhookAction, params: &ActionParams) -> Option<String> {
        params
            .webhook_endpoint
            .clone()
            .or_else(|| self.config.endpoints.get(hook.platform()).cloned())
            .filter(|endpoint| !endpoint.trim().is_empty())
    }

    async fn post_webhook(
        &self,
        hook: WebhookAction,
        contact: &Contact,
        params: &ActionParams,
    ) -> Result<Delivery, ActionError> {
        let platform = hook.platform();
        let endpoint = self
            .endpoint_for(hook, params)
            .ok_or(ActionError::MissingEndpoint { platform })?;
        let payload = webhook_envelope(contact, platform, &self.clock.now().to_rfc3339());
        self.webhooks.post_json(&endpoint, &payload).await?;
        Ok(Delivery::Posted { platform, endpoint })
    }

    async fn run_local(
        &self,
        action: LocalAction,
        contact: &Contact,
        params: &ActionParams,
    ) -> Result<Delivery, ActionError> {
        let summary = match action {
            LocalAction::AssignUser => match pick_assignee(&self.config.assignees, contact) {
                Some(user) => format!("assigned to {user}"),
                None => format!("kept owner {}", contact.owner_id),
            },
            LocalAction::GenerateBoleto => {
                let date = self.clock.now().format("%Y%m%d").to_string();
                format!("boleto {} generated", boleto_reference(contact, &date))
            }
            LocalAction::BackupData => {
                let snapshot = serde_json::to_vec(contact)
                    .map_err(|err| ActionError::LocalWrite(Box::new(err)))?;
                format!("backup of {} bytes", snapshot.len())
            }
            LocalAction::AddNote => {
                let note = params
                    .message
                    .as_deref()
                    .map_or_else(|| "Automation note".to_string(), |m| contact.render(m));
                self.write_note(contact, note).await?;
                "note added".to_string()
            }
            LocalAction::LogActivity => {
                let line = params
                    .message
                    .as_deref()
                    .map_or_else(|| "automation executed".to_string(), |m| contact.render(m));
                self.write_note(contact, format!("[activity] {line}")).await?;
                "activity logged".to_string()
            }
        };
        Ok(Delivery::Local { summary })
    }

    async fn write_note(&self, contact: &Contact, note: String) -> Result<(), ActionError> {
        self.contacts
            .append_note(contact.id, note)
            .await
            .map_err(|err| ActionError::LocalWrite(Box::new(err)))
    }
}

impl<CR, CO, WS, CK> ActionExecutor for ActionDispatcher<CR, CO, WS, CK>
where
    CR: ContactRepository + Send + Sync,
    CO: ChannelOpener + Send + Sync,
    WS: WebhookSender + Send + Sync,
    CK: Clock + Send + Sync,
{
    async fn execute(
        &self,
        action: &ActionKind,
        contact: &Contact,
        params: &ActionParams,
    ) -> Result<Delivery, ActionError> {
        match action {
            ActionKind::Direct(direct) => self.open_channel(*direct, contact, params).await,
            ActionKind::Webhook(hook) => self.post_webhook(*hook, contact, params).await,
            ActionKind::Local(local) => self.run_local(*local, contact, params).await,
            ActionKind::Unrecognized(name) => Err(ActionError::UnsupportedAction(name.clone())),
        }
    }
}

/// JSON body posted for webhook-class actions.
#[must_use]
pub fn webhook_envelope(contact: &Contact, platform: &str, timestamp: &str) -> serde_json::Value {
    serde_json::json!({
        "contact": {
            "id": contact.id,
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
            "whatsapp": contact.whatsapp,
            "company": contact.company,
            "type": contact.status_tag,
        },
        "timestamp": timestamp,
        "source": WEBHOOK_SOURCE,
        "platform": platform,
        "automation_triggered": true,
    })
}

/// Stable pick so repeated runs assign a contact to the same user.
fn pick_assignee<'a>(pool: &'a [String], contact: &Contact) -> Option<&'a str> {
    let len = u128::try_from(pool.len()).ok().filter(|len| *len > 0)?;
    let index = usize::try_from(contact.id.as_uuid().as_u128() % len).ok()?;
    pool.get(index).map(String::as_str)
}

fn boleto_reference(contact: &Contact, date: &str) -> String {
    let id = contact.id.as_uuid().simple().to_string();
    format!("BOL-{date}-{}", id[..8].to_uppercase())
}
