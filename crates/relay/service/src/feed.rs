//! Record-created change feed.

use relay_core::RecordCreated;
use tokio::sync::mpsc;

/// Create a bounded change feed whose subscription only yields events for
/// `collection`.
pub fn change_feed(capacity: usize, collection: impl Into<String>) -> (Publisher, Subscription) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    (
        Publisher { tx },
        Subscription {
            rx,
            collection: collection.into(),
        },
    )
}

/// Sending half of the change feed. Cloned into every producer.
#[derive(Clone)]
pub struct Publisher {
    tx: mpsc::Sender<RecordCreated>,
}

impl Publisher {
    /// Publish an event, waiting for room in the feed.
    pub async fn publish(&self, event: RecordCreated) -> color_eyre::eyre::Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("change feed closed, dropped event for {}", e.0.id))
    }
}

/// Subscription to record-created events in one collection.
pub struct Subscription {
    rx: mpsc::Receiver<RecordCreated>,
    collection: String,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Next event for the subscribed collection, or `None` once every
    /// publisher is gone.
    pub async fn next(&mut self) -> Option<RecordCreated> {
        while let Some(event) = self.rx.recv().await {
            if event.collection == self.collection {
                return Some(event);
            }

            tracing::debug!(
                collection = %event.collection,
                notification_id = %event.id,
                "ignoring event for other collection"
            );
        }

        None
    }
}
