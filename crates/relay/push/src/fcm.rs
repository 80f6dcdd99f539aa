//! Firebase Cloud Messaging HTTP v1 client.

use color_eyre::eyre::WrapErr as _;
use relay_core::{DataPayload, DeliveryError, DeliveryHints, Notification};
use serde::{Deserialize, Serialize};

use crate::Gateway;

/// Base URL of the FCM HTTP v1 API.
pub const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/v1";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: &'a Notification,
    data: &'a DataPayload,
    android: AndroidConfig<'a>,
    apns: ApnsConfig<'a>,
}

#[derive(Debug, Serialize)]
struct AndroidConfig<'a> {
    priority: &'static str,
    notification: AndroidNotification<'a>,
}

#[derive(Debug, Serialize)]
struct AndroidNotification<'a> {
    channel_id: &'a str,
    sound: &'a str,
}

#[derive(Debug, Serialize)]
struct ApnsConfig<'a> {
    payload: ApnsPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ApnsPayload<'a> {
    aps: Aps<'a>,
}

#[derive(Debug, Serialize)]
struct Aps<'a> {
    sound: &'a str,
    badge: u32,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// FCM gateway authenticated with an OAuth2 bearer token.
pub struct FcmGateway {
    client: reqwest::Client,
    send_url: String,
    access_token: String,
    hints: DeliveryHints,
}

impl FcmGateway {
    /// Create a client for `project_id` against the given API base URL.
    pub fn new(
        endpoint: &str,
        project_id: &str,
        access_token: String,
        hints: DeliveryHints,
        timeout: std::time::Duration,
    ) -> color_eyre::eyre::Result<Self> {
        if project_id.trim().is_empty() {
            color_eyre::eyre::bail!("FCM project id is not configured");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("failed to create FCM HTTP client")?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/projects/{}/messages:send",
                endpoint.trim_end_matches('/'),
                project_id
            ),
            access_token,
            hints,
        })
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    fn request<'a>(
        &'a self,
        token: &'a str,
        notification: &'a Notification,
        data: &'a DataPayload,
    ) -> SendRequest<'a> {
        SendRequest {
            message: Message {
                token,
                notification,
                data,
                android: AndroidConfig {
                    priority: if self.hints.high_priority {
                        "high"
                    } else {
                        "normal"
                    },
                    notification: AndroidNotification {
                        channel_id: &self.hints.channel_id,
                        sound: &self.hints.sound,
                    },
                },
                apns: ApnsConfig {
                    payload: ApnsPayload {
                        aps: Aps {
                            sound: &self.hints.sound,
                            badge: self.hints.badge,
                        },
                    },
                },
            },
        }
    }
}

/// Map a non-success FCM response to a delivery error.
fn api_error(status: u16, body: &str) -> DeliveryError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => {
            let code = if error.status.is_empty() {
                status.to_string()
            } else {
                error.status
            };
            let message = if error.message.is_empty() {
                format!("FCM request failed with status {}", status)
            } else {
                error.message
            };
            DeliveryError::new(code, message)
        }
        Err(_) if body.trim().is_empty() => DeliveryError::new(
            status.to_string(),
            format!("FCM request failed with status {}", status),
        ),
        Err(_) => DeliveryError::new(status.to_string(), body.trim()),
    }
}

impl Gateway for FcmGateway {
    async fn deliver(
        &self,
        token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<String, DeliveryError> {
        let request = self.request(token, notification, data);

        let resp = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(DeliveryError::transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let sent: SendResponse = resp.json().await.map_err(DeliveryError::transport)?;
        Ok(sent.name)
    }
}
