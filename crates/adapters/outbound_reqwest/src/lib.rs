//! # crmflow-adapter-outbound-reqwest
//!
//! Outbound delivery adapter.
//!
//! ## Responsibilities
//! - Implement `WebhookSender` with [reqwest](https://docs.rs/reqwest): a JSON
//!   `POST` bounded by a client-wide timeout, non-2xx answers are failures
//! - Implement `ChannelOpener` by building `wa.me` and `mailto:` deep links,
//!   handed to the desktop through [open](https://docs.rs/open) when enabled
//!
//! ## Dependency rule
//! Depends on `crmflow-app` (for port traits) and `crmflow-domain` (for
//! `DeliveryError`). Never leaks reqwest types past the port boundary.

pub mod config;
pub mod deep_link;
pub mod error;
pub mod webhook;

pub use config::Config;
pub use deep_link::DeepLinkOpener;
pub use error::OutboundError;
pub use webhook::ReqwestWebhookSender;
