//! Outbound ports: deliveries leaving the process.

use std::future::Future;

use crmflow_domain::action::DeliveryError;

/// Posts JSON envelopes to integration endpoints.
///
/// Implementations must bound every call with a timeout and report
/// transport failures and rejected responses as [`DeliveryError`].
pub trait WebhookSender {
    fn post_json(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Opens a message composer on a messaging channel.
pub trait ChannelOpener {
    /// Open a messaging-app chat with a digits-only number.
    fn open_whatsapp(
        &self,
        number: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Open an email draft.
    fn open_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

impl<T: WebhookSender + Send + Sync> WebhookSender for std::sync::Arc<T> {
    fn post_json(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        (**self).post_json(endpoint, payload)
    }
}

impl<T: ChannelOpener + Send + Sync> ChannelOpener for std::sync::Arc<T> {
    fn open_whatsapp(
        &self,
        number: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        (**self).open_whatsapp(number, message)
    }

    fn open_email(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        (**self).open_email(address, subject, body)
    }
}
