//! Database models.

use color_eyre::eyre::WrapErr as _;
use diesel::prelude::*;
use relay_core::{NotificationRecord, RecordId, Status};

use crate::schema::push_notifications;

/// Notification record row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = push_notifications)]
pub struct NotificationRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub destination_token: String,
    pub payload: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub sent_at: Option<chrono::NaiveDateTime>,
    pub failed_at: Option<chrono::NaiveDateTime>,
    pub message_id: Option<String>,
    pub error_detail: Option<String>,
}

/// New notification for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_notifications)]
pub struct NewNotificationRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub destination_token: &'a str,
    pub payload: &'a str,
    pub status: &'a str,
    pub created_at: chrono::NaiveDateTime,
}

fn utc(at: chrono::NaiveDateTime) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_naive_utc_and_offset(at, chrono::Utc)
}

impl TryFrom<NotificationRow> for NotificationRecord {
    type Error = color_eyre::eyre::Report;

    fn try_from(row: NotificationRow) -> color_eyre::eyre::Result<Self> {
        let status: Status = row.status.parse()?;
        let payload = serde_json::from_str(&row.payload)
            .wrap_err_with(|| format!("malformed payload for notification {}", row.id))?;

        Ok(Self {
            id: RecordId::new(row.id),
            title: row.title,
            body: row.body,
            destination_token: row.destination_token,
            payload,
            status,
            created_at: utc(row.created_at),
            sent_at: row.sent_at.map(utc),
            failed_at: row.failed_at.map(utc),
            message_id: row.message_id,
            error_detail: row.error_detail,
        })
    }
}
