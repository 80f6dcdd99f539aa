//! Process-wide gateway client selected by configuration.

use std::path::PathBuf;
use std::sync::OnceLock;

use color_eyre::eyre::WrapErr as _;
use relay_core::{DataPayload, DeliveryError, DeliveryHints, Notification};
use serde::{Deserialize, Serialize};

use crate::{ApnsGateway, FCM_ENDPOINT, FcmGateway, Gateway};

/// Push provider backing the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Fcm,
    Apns,
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub provider: Provider,
    pub request_timeout_secs: u64,
    pub hints: DeliveryHints,
    pub fcm: FcmConfig,
    pub apns: ApnsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Fcm,
            request_timeout_secs: 10,
            hints: DeliveryHints::default(),
            fcm: FcmConfig::default(),
            apns: ApnsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FcmConfig {
    pub endpoint: String,
    pub project_id: String,
    /// Bearer token; read from `access_token_env` when unset.
    pub access_token: Option<String>,
    pub access_token_env: String,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            endpoint: FCM_ENDPOINT.to_string(),
            project_id: String::new(),
            access_token: None,
            access_token_env: "FCM_ACCESS_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApnsConfig {
    /// PKCS12 certificate file.
    pub certificate_path: PathBuf,
    pub password: String,
    pub topic: Option<String>,
    pub sandbox: bool,
}

/// Gateway client for the configured provider.
pub enum GatewayClient {
    Fcm(FcmGateway),
    Apns(ApnsGateway),
}

impl GatewayClient {
    pub fn from_config(config: &GatewayConfig) -> color_eyre::eyre::Result<Self> {
        let hints = config.hints.clone();

        match config.provider {
            Provider::Fcm => {
                let access_token = match &config.fcm.access_token {
                    Some(token) => token.clone(),
                    None => std::env::var(&config.fcm.access_token_env).wrap_err_with(|| {
                        format!(
                            "FCM access token not configured and {} is unset",
                            config.fcm.access_token_env
                        )
                    })?,
                };

                let gateway = FcmGateway::new(
                    &config.fcm.endpoint,
                    &config.fcm.project_id,
                    access_token,
                    hints,
                    std::time::Duration::from_secs(config.request_timeout_secs),
                )?;

                Ok(Self::Fcm(gateway))
            }
            Provider::Apns => {
                let cert = std::fs::read(&config.apns.certificate_path).wrap_err_with(|| {
                    format!(
                        "failed to read APNs certificate {}",
                        config.apns.certificate_path.display()
                    )
                })?;

                let endpoint = if config.apns.sandbox {
                    a2::Endpoint::Sandbox
                } else {
                    a2::Endpoint::Production
                };

                let gateway = ApnsGateway::new(
                    &cert,
                    &config.apns.password,
                    endpoint,
                    config.apns.topic.clone(),
                    hints,
                )?;

                Ok(Self::Apns(gateway))
            }
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Self::Fcm(_) => Provider::Fcm,
            Self::Apns(_) => Provider::Apns,
        }
    }
}

impl Gateway for GatewayClient {
    async fn deliver(
        &self,
        token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<String, DeliveryError> {
        match self {
            Self::Fcm(gateway) => gateway.deliver(token, notification, data).await,
            Self::Apns(gateway) => gateway.deliver(token, notification, data).await,
        }
    }
}

static CLIENT: OnceLock<GatewayClient> = OnceLock::new();

/// Build the process-wide gateway client on first call.
///
/// Later calls return the existing client and ignore `config`.
pub fn ensure_initialized(config: &GatewayConfig) -> color_eyre::eyre::Result<&'static GatewayClient> {
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }

    let client = GatewayClient::from_config(config)?;
    let client = CLIENT.get_or_init(|| client);

    tracing::info!(provider = ?client.provider(), "push gateway initialized");

    Ok(client)
}
