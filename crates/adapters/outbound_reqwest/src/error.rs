//! Outbound adapter error types.

/// Errors raised by the outbound adapter before any delivery happens.
///
/// Per-delivery failures surface as
/// [`DeliveryError`](crmflow_domain::action::DeliveryError) instead.
#[derive(Debug, thiserror::Error)]
pub enum OutboundError {
    #[error("unable to build http client")]
    Client(#[source] reqwest::Error),

    #[error("endpoint answered with status {status}")]
    Rejected { status: u16 },

    #[error("unable to launch {link}")]
    Launch {
        link: String,
        #[source]
        source: std::io::Error,
    },
}
