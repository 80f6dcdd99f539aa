//! Upstream producer: stores new notifications and announces them.

use color_eyre::eyre::WrapErr as _;
use relay_core::{NewNotification, NotificationRecord, RecordCreated, RecordId};
use relay_storage::NotificationStore;

use crate::Publisher;

/// Inserts pending notifications and publishes their record-created events.
#[derive(Clone)]
pub struct Producer<S> {
    store: S,
    publisher: Publisher,
    collection: String,
}

impl<S> Producer<S> {
    pub fn new(store: S, publisher: Publisher, collection: impl Into<String>) -> Self {
        Self {
            store,
            publisher,
            collection: collection.into(),
        }
    }
}

impl<S: NotificationStore> Producer<S> {
    /// Queue a notification for delivery.
    ///
    /// The record is durable before its event is published. If publishing
    /// fails the record stays `pending`.
    pub async fn submit(&self, new: NewNotification) -> color_eyre::eyre::Result<NotificationRecord> {
        let record = self
            .store
            .insert(&new)
            .wrap_err("failed to store notification")?;

        tracing::info!(notification_id = %record.id, "notification queued");

        self.publisher
            .publish(RecordCreated::new(self.collection.clone(), record.clone()))
            .await?;

        Ok(record)
    }

    /// Look up a notification and its delivery status.
    pub fn get(&self, id: &RecordId) -> color_eyre::eyre::Result<Option<NotificationRecord>> {
        self.store.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed;
    use relay_core::{DEFAULT_COLLECTION, Status};
    use relay_storage::MemoryStorage;

    #[tokio::test]
    async fn test_submit_stores_then_publishes() {
        let store = MemoryStorage::new();
        let (publisher, mut subscription) = change_feed(4, DEFAULT_COLLECTION);
        let producer = Producer::new(store.clone(), publisher, DEFAULT_COLLECTION);

        let record = producer
            .submit(NewNotification {
                destination_token: "tok123".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(record.status, Status::Pending);
        assert!(producer.get(&record.id).unwrap().is_some());

        let event = subscription.next().await.unwrap();
        assert_eq!(event.id, record.id);
        assert_eq!(event.record, Some(record));
    }
}
