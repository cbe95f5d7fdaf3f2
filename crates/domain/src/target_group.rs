//! Target group: a named predicate selecting the contacts an automation acts upon.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::time::Timestamp;

/// Upper bound on how many contacts a single run may touch.
pub const MAX_TARGETS: usize = 50;

/// Score at or above which a lead counts as hot.
pub const HOT_SCORE: u8 = 80;

const WARM_SCORE: u8 = 50;
const INACTIVE_AFTER_DAYS: i64 = 30;

/// Named contact selection.
///
/// Unknown names are kept verbatim as [`TargetGroup::Unrecognized`] and
/// resolve like [`TargetGroup::All`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetGroup {
    #[default]
    All,
    HotLeads,
    WarmLeads,
    ColdLeads,
    InactiveLeads,
    NewLeads,
    Customers,
    Unrecognized(String),
}

impl TargetGroup {
    /// Every recognized group, in catalog order.
    pub const KNOWN: [Self; 7] = [
        Self::All,
        Self::HotLeads,
        Self::WarmLeads,
        Self::ColdLeads,
        Self::InactiveLeads,
        Self::NewLeads,
        Self::Customers,
    ];

    /// Canonical name of the group.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::HotLeads => "hot_leads",
            Self::WarmLeads => "warm_leads",
            Self::ColdLeads => "cold_leads",
            Self::InactiveLeads => "inactive_leads",
            Self::NewLeads => "new_leads",
            Self::Customers => "customers",
            Self::Unrecognized(name) => name,
        }
    }

    /// Whether `contact` belongs to this group at time `now`.
    #[must_use]
    pub fn includes(&self, contact: &Contact, now: Timestamp) -> bool {
        match self {
            Self::All | Self::Unrecognized(_) => true,
            Self::HotLeads => contact.score >= HOT_SCORE,
            Self::WarmLeads => (WARM_SCORE..HOT_SCORE).contains(&contact.score),
            Self::ColdLeads => contact.score < WARM_SCORE,
            Self::InactiveLeads => contact
                .last_contacted_at
                .is_none_or(|ts| now - ts > Duration::days(INACTIVE_AFTER_DAYS)),
            Self::NewLeads => contact.status_tag.eq_ignore_ascii_case("new"),
            Self::Customers => contact.status_tag.eq_ignore_ascii_case("customer"),
        }
    }

    /// Select the contacts of this group, preserving input order and
    /// keeping at most [`MAX_TARGETS`].
    #[must_use]
    pub fn resolve(&self, contacts: Vec<Contact>, now: Timestamp) -> Vec<Contact> {
        contacts
            .into_iter()
            .filter(|contact| self.includes(contact, now))
            .take(MAX_TARGETS)
            .collect()
    }
}

impl FromStr for TargetGroup {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Ok(Self::KNOWN
            .into_iter()
            .find(|group| group.as_str() == name)
            .unwrap_or_else(|| Self::Unrecognized(name.to_string())))
    }
}

impl From<String> for TargetGroup {
    fn from(value: String) -> Self {
        let Ok(group) = value.parse::<Self>();
        group
    }
}

impl From<TargetGroup> for String {
    fn from(value: TargetGroup) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
