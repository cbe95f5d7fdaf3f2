//! Channel opener producing messaging deep links.
//!
//! A WhatsApp chat opens through `https://wa.me/{number}?text={message}`,
//! an email draft through `mailto:{address}?subject=..&body=..`. When link
//! launching is disabled the link is only logged, which is what a headless
//! daemon wants.

use crmflow_app::ports::ChannelOpener;
use crmflow_domain::action::DeliveryError;

use crate::error::OutboundError;

/// Build a `wa.me` chat link. `number` is expected to be digits only.
#[must_use]
pub fn whatsapp_link(number: &str, message: &str) -> String {
    format!(
        "https://wa.me/{number}?text={}",
        urlencoding::encode(message)
    )
}

/// Build a `mailto:` draft link.
#[must_use]
pub fn email_link(address: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{address}?subject={}&body={}",
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// [`ChannelOpener`] that hands deep links to the desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepLinkOpener {
    launch: bool,
}

impl DeepLinkOpener {
    #[must_use]
    pub fn new(launch: bool) -> Self {
        Self { launch }
    }

    #[must_use]
    pub fn launches_links(&self) -> bool {
        self.launch
    }

    fn dispatch(&self, target: &str, link: String) -> Result<(), DeliveryError> {
        if !self.launch {
            tracing::info!(%target, %link, "deep link ready");
            return Ok(());
        }
        open::that_detached(&link).map_err(|source| {
            DeliveryError::new(target, OutboundError::Launch { link, source })
        })
    }
}

impl ChannelOpener for DeepLinkOpener {
    async fn open_whatsapp(&self, number: &str, message: &str) -> Result<(), DeliveryError> {
        self.dispatch(number, whatsapp_link(number, message))
    }

    async fn open_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        self.dispatch(address, email_link(address, subject, body))
    }
}
