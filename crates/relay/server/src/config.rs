use std::net::SocketAddr;
use std::path::PathBuf;

use relay_core::{DEFAULT_COLLECTION, PayloadSchema};
use relay_push::GatewayConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    pub database_url: String,
    /// Collection whose record-created events are dispatched.
    pub collection: String,
    pub feed_capacity: usize,
    /// Upper bound on concurrent deliveries.
    pub max_in_flight: usize,
    pub dispatch: PayloadSchema,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: "relay.db".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            feed_capacity: 1024,
            max_in_flight: 64,
            dispatch: PayloadSchema::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn config_path() -> PathBuf {
        std::env::var_os("RELAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("relay.toml"))
    }

    /// `DATABASE_URL` wins over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_push::Provider;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.collection, "push_notifications");
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.max_in_flight, 64);
        assert_eq!(config.gateway.provider, Provider::Fcm);
        assert_eq!(config.gateway.hints.channel_id, "high_importance_channel");
        assert_eq!(config.gateway.hints.badge, 1);
        assert_eq!(
            config.dispatch.data_keys,
            ["type", "topicId", "commentId", "notificationId"]
        );
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            listen = "127.0.0.1:9000"
            collection = "alerts"
            max_in_flight = 8

            [dispatch]
            default_title = "Heads up"

            [gateway]
            provider = "apns"

            [gateway.apns]
            certificate_path = "/etc/relay/push.p12"
            topic = "com.example.app"
            sandbox = true

            [gateway.hints]
            badge = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.collection, "alerts");
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.dispatch.default_title, "Heads up");
        assert_eq!(config.dispatch.data_keys.len(), 4);
        assert_eq!(config.gateway.provider, Provider::Apns);
        assert_eq!(config.gateway.apns.topic.as_deref(), Some("com.example.app"));
        assert!(config.gateway.apns.sandbox);
        assert_eq!(config.gateway.hints.badge, 3);
        assert_eq!(config.gateway.hints.sound, "default");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::parse("listen = 42"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
