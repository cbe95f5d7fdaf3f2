//! Webhook sender backed by reqwest.

use std::time::Duration;

use crmflow_app::ports::WebhookSender;
use crmflow_domain::action::{DeliveryError, endpoint_origin};

use crate::error::OutboundError;

/// Posts JSON envelopes with a shared [`reqwest::Client`].
///
/// The timeout is set once on the client and bounds every request.
#[derive(Debug, Clone)]
pub struct ReqwestWebhookSender {
    client: reqwest::Client,
}

impl ReqwestWebhookSender {
    /// Build a sender whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`OutboundError::Client`] if the TLS backend cannot be set up.
    pub fn new(timeout: Duration) -> Result<Self, OutboundError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(OutboundError::Client)?;
        Ok(Self { client })
    }
}

impl WebhookSender for ReqwestWebhookSender {
    async fn post_json(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|err| DeliveryError::new(endpoint, err.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(endpoint = %endpoint_origin(endpoint), status = status.as_u16(), "webhook rejected");
            return Err(DeliveryError::new(
                endpoint,
                OutboundError::Rejected {
                    status: status.as_u16(),
                },
            ));
        }
        Ok(())
    }
}
