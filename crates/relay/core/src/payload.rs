//! Delivery payload construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::NotificationRecord;

/// Title used when a record has none.
pub const DEFAULT_TITLE: &str = "알림";

/// Data keys forwarded to the gateway when none are configured.
pub const DEFAULT_DATA_KEYS: &[&str] = &["type", "topicId", "commentId", "notificationId"];

/// Visible part of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// String data fields delivered alongside the notification.
pub type DataPayload = BTreeMap<String, String>;

/// Rules for turning a record into a delivery payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadSchema {
    /// Title applied when the record's title is empty.
    pub default_title: String,
    /// The only data keys forwarded. Missing ones become empty strings.
    pub data_keys: Vec<String>,
}

impl Default for PayloadSchema {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            data_keys: DEFAULT_DATA_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl PayloadSchema {
    pub fn notification(&self, record: &NotificationRecord) -> Notification {
        let title = if record.title.is_empty() {
            self.default_title.clone()
        } else {
            record.title.clone()
        };

        Notification {
            title,
            body: record.body.clone(),
        }
    }

    /// Copy the declared keys out of the record payload; unknown keys are dropped.
    pub fn data(&self, record: &NotificationRecord) -> DataPayload {
        self.data_keys
            .iter()
            .map(|key| {
                let value = record.payload.get(key).cloned().unwrap_or_default();
                (key.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewNotification, RecordId};

    fn record(title: &str, payload: &[(&str, &str)]) -> NotificationRecord {
        NotificationRecord::pending(
            RecordId::new("n1"),
            NewNotification {
                title: title.into(),
                body: String::new(),
                destination_token: "tok".into(),
                payload: payload
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_default_title_applied() {
        let schema = PayloadSchema::default();
        let notification = schema.notification(&record("", &[]));
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert_eq!(notification.body, "");

        let notification = schema.notification(&record("New comment", &[]));
        assert_eq!(notification.title, "New comment");
    }

    #[test]
    fn test_data_keeps_only_declared_keys() {
        let schema = PayloadSchema::default();
        let data = schema.data(&record(
            "",
            &[("type", "comment"), ("topicId", "t1"), ("secret", "x")],
        ));

        let expected: DataPayload = [
            ("type", "comment"),
            ("topicId", "t1"),
            ("commentId", ""),
            ("notificationId", ""),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(data, expected);
    }

    #[test]
    fn test_custom_keys() {
        let schema = PayloadSchema {
            default_title: "Hello".into(),
            data_keys: vec!["room".into()],
        };
        let data = schema.data(&record("", &[("type", "comment")]));
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("room").map(String::as_str), Some(""));
    }
}
