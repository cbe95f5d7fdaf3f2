//! # crmflow-domain
//!
//! Pure domain model for the crmflow outbound-automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Contacts** (the records automations act upon)
//! - Define **Target groups** (named predicates selecting a bounded contact subset)
//! - Define **Triggers** (business-event kinds and their event predicates)
//! - Define **Actions** (side-effect kinds grouped by execution shape)
//! - Define **Automations** (trigger → target group → action bindings)
//! - Define **Execution records** and run summaries
//! - Compute time-based **schedule** dueness
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod automation;
pub mod catalog;
pub mod contact;
pub mod execution;
pub mod schedule;
pub mod target_group;
pub mod trigger;
