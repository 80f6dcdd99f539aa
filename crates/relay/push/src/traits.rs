//! Gateway traits.

use relay_core::{DataPayload, DeliveryError, Notification};

/// Push-delivery gateway client.
///
/// Each call is exactly one round trip to the provider; retry policy belongs
/// to the caller.
#[trait_variant::make(Send)]
pub trait Gateway: Send + Sync {
    /// Deliver a notification to a device, returning the provider message id.
    async fn deliver(
        &self,
        token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<String, DeliveryError>;
}

impl<G: Gateway> Gateway for &G {
    async fn deliver(
        &self,
        token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<String, DeliveryError> {
        (**self).deliver(token, notification, data).await
    }
}
