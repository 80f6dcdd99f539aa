//! Notification records and their delivery status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned notification identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Delivery status of a notification record.
///
/// `Sent` and `Failed` are terminal: a record leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, thiserror::Error)]
#[error("unknown notification status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A queued push notification and its delivery outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub destination_token: String,
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl NotificationRecord {
    /// Build a fresh pending record from producer input.
    pub fn pending(id: RecordId, new: NewNotification, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            body: new.body,
            destination_token: new.destination_token,
            payload: new.payload,
            status: Status::Pending,
            created_at,
            sent_at: None,
            failed_at: None,
            message_id: None,
            error_detail: None,
        }
    }

    /// Destination token with surrounding whitespace removed, if any remains.
    pub fn valid_destination(&self) -> Option<&str> {
        let token = self.destination_token.trim();
        (!token.is_empty()).then_some(token)
    }

    /// Apply a terminal outcome. Returns `false` if the record was already terminal.
    pub fn apply(&mut self, outcome: &Outcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        match outcome {
            Outcome::Sent { message_id, at } => {
                self.status = Status::Sent;
                self.sent_at = Some(*at);
                self.message_id = Some(message_id.clone());
            }
            Outcome::Failed { detail, at } => {
                self.status = Status::Failed;
                self.failed_at = Some(*at);
                self.error_detail = Some(detail.clone());
            }
        }

        true
    }
}

/// Producer input for a new notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub destination_token: String,
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

/// Terminal delivery outcome written back to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Sent { message_id: String, at: DateTime<Utc> },
    Failed { detail: String, at: DateTime<Utc> },
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Self::Sent { .. } => Status::Sent,
            Self::Failed { .. } => Status::Failed,
        }
    }
}
