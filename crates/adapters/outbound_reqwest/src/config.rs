//! Outbound adapter settings.

use std::time::Duration;

use crate::deep_link::DeepLinkOpener;
use crate::error::OutboundError;
use crate::webhook::ReqwestWebhookSender;

/// Default upper bound on one webhook call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the outbound adapter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on one webhook call, connection included.
    pub timeout: Duration,
    /// Hand deep links to the desktop instead of only logging them.
    pub launch_links: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            launch_links: false,
        }
    }
}

impl Config {
    /// Build the webhook sender and channel opener.
    ///
    /// # Errors
    ///
    /// Returns [`OutboundError::Client`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<(ReqwestWebhookSender, DeepLinkOpener), OutboundError> {
        let sender = ReqwestWebhookSender::new(self.timeout)?;
        let opener = DeepLinkOpener::new(self.launch_links);
        Ok((sender, opener))
    }
}
