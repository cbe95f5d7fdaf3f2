//! # crmflow-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRepository`: CRUD, active selection and atomic stats updates
//!   - `ContactRepository`: contact listing and audit notes
//!   - `ExecutionLog`: append & query execution records
//!   - `WebhookSender` / `ChannelOpener`: outbound deliveries
//!   - `Clock`: injectable time source
//! - Define **driving/inbound** use-cases:
//!   - `ActionDispatcher`: execute one action against one contact
//!   - `Orchestrator`: paced, fault-isolated automation runs
//!   - `Scheduler`: recurring dueness checks for time-based triggers
//!   - `EventDispatcher`: route business events to matching automations
//!   - `AutomationService`: manage automations and read their history
//!
//! ## Dependency rule
//! Depends on `crmflow-domain` only (plus `tokio` for timers and locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod event_dispatcher;
pub mod orchestrator;
pub mod ports;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
