//! APNs gateway implementation using the a2 crate.

use a2::NotificationBuilder as _;
use color_eyre::eyre::WrapErr as _;
use relay_core::{DataPayload, DeliveryError, DeliveryHints, Notification};

use crate::Gateway;

/// APNs gateway using certificate authentication.
pub struct ApnsGateway {
    client: a2::Client,
    topic: Option<String>,
    hints: DeliveryHints,
}

impl ApnsGateway {
    /// Create a new APNs gateway from PKCS12 certificate bytes and password.
    pub fn new(
        pkcs12_der: &[u8],
        password: &str,
        endpoint: a2::Endpoint,
        topic: Option<String>,
        hints: DeliveryHints,
    ) -> color_eyre::eyre::Result<Self> {
        let mut cursor = std::io::Cursor::new(pkcs12_der);
        let config = a2::ClientConfig::new(endpoint);

        let client = a2::Client::certificate(&mut cursor, password, config)
            .wrap_err("failed to create APNs client")?;

        Ok(Self {
            client,
            topic,
            hints,
        })
    }
}

impl Gateway for ApnsGateway {
    async fn deliver(
        &self,
        token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<String, DeliveryError> {
        let priority = if self.hints.high_priority {
            a2::Priority::High
        } else {
            a2::Priority::Normal
        };

        let apns_id = uuid::Uuid::new_v4().to_string();

        let mut payload = a2::DefaultNotificationBuilder::new()
            .set_title(&notification.title)
            .set_body(&notification.body)
            .set_sound(&self.hints.sound)
            .set_badge(self.hints.badge)
            .set_category(&self.hints.channel_id)
            .build(
                token,
                a2::NotificationOptions {
                    apns_id: Some(&apns_id),
                    apns_topic: self.topic.as_deref(),
                    apns_priority: Some(priority),
                    ..Default::default()
                },
            );

        payload
            .add_custom_data("data", data)
            .map_err(|e| DeliveryError::new("payload", e.to_string()))?;

        match self.client.send(payload).await {
            Ok(response) => Ok(message_id(response.apns_id, &apns_id)),
            Err(a2::Error::ResponseError(response)) => {
                let message = match response.error {
                    Some(body) => format!("{:?}", body.reason),
                    None => format!("APNs rejected notification with status {}", response.code),
                };
                Err(DeliveryError::new(response.code.to_string(), message))
            }
            Err(e) => Err(DeliveryError::transport(e)),
        }
    }
}

/// The id APNs echoed back, or the one sent with the request when the
/// response carries none.
fn message_id(returned: Option<String>, requested: &str) -> String {
    returned
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| requested.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_prefers_returned_id() {
        assert_eq!(
            message_id(Some("apns-1".into()), "requested"),
            "apns-1"
        );
    }

    #[test]
    fn test_message_id_falls_back_to_requested_id() {
        assert_eq!(message_id(None, "requested"), "requested");
        assert_eq!(message_id(Some(String::new()), "requested"), "requested");
    }
}
