//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`CrmFlowError`] via `#[from]` at the port boundary.

/// Top-level error returned by ports and application services.
#[derive(Debug, thiserror::Error)]
pub enum CrmFlowError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// Failure inside a persistence or IO adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("outcome must be `success` or `failed`")]
    InvalidOutcome,

    #[error("webhook endpoint must be an http(s) URL")]
    InvalidEndpoint,

    #[error("delay must be at least one minute")]
    ZeroDelay,

    #[error("status must be `active` or `paused`")]
    InvalidStatus,

    #[error("identifier is not a valid UUID")]
    InvalidId,
}

/// A lookup did not find the requested record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
