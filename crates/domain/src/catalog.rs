//! Catalog: the static registry of recognized triggers, actions and target groups.

use serde::Serialize;

use crate::action::ActionKind;
use crate::target_group::TargetGroup;
use crate::trigger::TriggerKind;

/// One catalog line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: &'static str,
}

/// Everything an automation can be built from.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub triggers: Vec<CatalogEntry>,
    pub actions: Vec<CatalogEntry>,
    pub target_groups: Vec<String>,
}

#[must_use]
pub fn triggers() -> Vec<CatalogEntry> {
    TriggerKind::KNOWN
        .into_iter()
        .map(|kind| CatalogEntry {
            name: kind.as_str().to_string(),
            description: kind.description(),
        })
        .collect()
}

#[must_use]
pub fn actions() -> Vec<CatalogEntry> {
    ActionKind::known()
        .into_iter()
        .map(|kind| CatalogEntry {
            name: kind.as_str().to_string(),
            description: kind.description(),
        })
        .collect()
}

/// The full catalog.
#[must_use]
pub fn catalog() -> Catalog {
    Catalog {
        triggers: triggers(),
        actions: actions(),
        target_groups: TargetGroup::KNOWN
            .into_iter()
            .map(String::from)
            .collect(),
    }
}
