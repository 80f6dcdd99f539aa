//! Gateway delivery errors and hints.

use serde::{Deserialize, Serialize};

/// A failed delivery attempt as reported by the push provider.
///
/// Displays as the provider message alone so it can be stored verbatim as the
/// record's error detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DeliveryError {
    /// Provider error code (e.g. `UNREGISTERED`, `400`, `transport`).
    pub code: String,
    /// Human-readable cause.
    pub message: String,
}

impl DeliveryError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error raised before or while reaching the provider.
    pub fn transport(error: impl std::fmt::Display) -> Self {
        Self::new("transport", error.to_string())
    }
}

/// Per-platform delivery hints applied to every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryHints {
    /// Request high-priority delivery.
    pub high_priority: bool,
    /// Android notification channel, also used as the APNs category.
    pub channel_id: String,
    pub sound: String,
    pub badge: u32,
}

impl Default for DeliveryHints {
    fn default() -> Self {
        Self {
            high_priority: true,
            channel_id: "high_importance_channel".to_string(),
            sound: "default".to_string(),
            badge: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message_only() {
        let err = DeliveryError::new("RESOURCE_EXHAUSTED", "quota exceeded");
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(err.code, "RESOURCE_EXHAUSTED");
    }
}
