//! Contact: a lead or customer record owned by the surrounding CRM.
//!
//! The engine only reads contacts, except for the audit actions which
//! append free-text notes through the contact repository.

use serde::{Deserialize, Serialize};

use crate::error::{CrmFlowError, ValidationError};
use crate::id::{ContactId, UserId};
use crate::time::Timestamp;

/// A CRM contact that automations act upon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub company: Option<String>,
    /// Pipeline tag such as `new`, `qualified` or `customer`.
    pub status_tag: String,
    pub owner_id: UserId,
    /// Lead score in `0..=100`.
    pub score: u8,
    pub last_contacted_at: Option<Timestamp>,
}

impl Contact {
    /// Create a builder for constructing a [`Contact`].
    #[must_use]
    pub fn builder() -> ContactBuilder {
        ContactBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), CrmFlowError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Number usable for messaging-app deep links: the `whatsapp` field,
    /// falling back to `phone`, reduced to digits only.
    ///
    /// Returns `None` when neither field carries a single digit.
    #[must_use]
    pub fn messaging_number(&self) -> Option<String> {
        [self.whatsapp.as_deref(), self.phone.as_deref()]
            .into_iter()
            .flatten()
            .map(digits_only)
            .find(|digits| !digits.is_empty())
    }

    /// Email address, if it looks deliverable.
    #[must_use]
    pub fn email_address(&self) -> Option<&str> {
        let email = self.email.trim();
        email.contains('@').then_some(email)
    }

    /// Substitute `{name}` and `{company}` placeholders in a message template.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{name}", &self.name)
            .replace("{company}", self.company.as_deref().unwrap_or(""))
    }
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Step-by-step builder for [`Contact`].
#[derive(Debug, Default)]
pub struct ContactBuilder {
    id: Option<ContactId>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    whatsapp: Option<String>,
    company: Option<String>,
    status_tag: Option<String>,
    owner_id: Option<UserId>,
    score: u8,
    last_contacted_at: Option<Timestamp>,
}

impl ContactBuilder {
    #[must_use]
    pub fn id(mut self, id: ContactId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn whatsapp(mut self, whatsapp: impl Into<String>) -> Self {
        self.whatsapp = Some(whatsapp.into());
        self
    }

    #[must_use]
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    #[must_use]
    pub fn status_tag(mut self, tag: impl Into<String>) -> Self {
        self.status_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn owner_id(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    #[must_use]
    pub fn score(mut self, score: u8) -> Self {
        self.score = score.min(100);
        self
    }

    #[must_use]
    pub fn last_contacted_at(mut self, ts: Timestamp) -> Self {
        self.last_contacted_at = Some(ts);
        self
    }

    /// Consume the builder, validate, and return a [`Contact`].
    ///
    /// # Errors
    ///
    /// Returns [`CrmFlowError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Contact, CrmFlowError> {
        let contact = Contact {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone,
            whatsapp: self.whatsapp,
            company: self.company,
            status_tag: self.status_tag.unwrap_or_else(|| "new".to_string()),
            owner_id: self.owner_id.unwrap_or_default(),
            score: self.score,
            last_contacted_at: self.last_contacted_at,
        };
        contact.validate()?;
        Ok(contact)
    }
}
