//! Test doubles shared by the service tests.

use std::sync::Mutex;

use relay_core::{DataPayload, DeliveryError, NewNotification, Notification, NotificationRecord};
use relay_push::Gateway;
use relay_storage::{MemoryStorage, NotificationStore};

/// Gateway that returns a fixed result and records every call.
pub struct MockGateway {
    result: Result<String, DeliveryError>,
    calls: Mutex<Vec<Delivery>>,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub token: String,
    pub notification: Notification,
    pub data: DataPayload,
}

impl MockGateway {
    pub fn succeeding(message_id: &str) -> Self {
        Self {
            result: Ok(message_id.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(code: &str, message: &str) -> Self {
        Self {
            result: Err(DeliveryError::new(code, message)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Delivery> {
        self.calls.lock().unwrap().clone()
    }
}

impl Gateway for MockGateway {
    async fn deliver(
        &self,
        token: &str,
        notification: &Notification,
        data: &DataPayload,
    ) -> Result<String, DeliveryError> {
        self.calls.lock().unwrap().push(Delivery {
            token: token.to_string(),
            notification: notification.clone(),
            data: data.clone(),
        });
        self.result.clone()
    }
}

pub fn pending(store: &MemoryStorage, token: &str) -> NotificationRecord {
    store
        .insert(&NewNotification {
            destination_token: token.to_string(),
            ..Default::default()
        })
        .unwrap()
}
