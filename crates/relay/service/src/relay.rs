//! Event loop driving the dispatcher.

use std::sync::Arc;

use relay_core::RecordId;
use relay_push::Gateway;
use relay_storage::AllStorage;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{DispatchError, Dispatched, Dispatcher, Subscription};

/// Tally of finished invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub superseded: usize,
    pub errors: usize,
}

/// Runs one dispatcher invocation per record-created event, with at most
/// `max_in_flight` invocations running at once.
pub struct Relay<S, G> {
    dispatcher: Arc<Dispatcher<S, G>>,
    permits: Arc<Semaphore>,
}

impl<S, G> Relay<S, G>
where
    S: AllStorage + 'static,
    G: Gateway + 'static,
{
    pub fn new(dispatcher: Dispatcher<S, G>, max_in_flight: usize) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Consume events until the feed closes, then wait for in-flight
    /// invocations to finish.
    pub async fn run(self, mut subscription: Subscription) -> RelayStats {
        tracing::info!(collection = %subscription.collection(), "relay started");

        let mut tasks = JoinSet::new();
        let mut stats = RelayStats::default();

        loop {
            tokio::select! {
                event = subscription.next() => {
                    let Some(event) = event else { break };

                    // Stop pulling events while the cap is reached; the
                    // bounded feed pushes back on producers.
                    let permit = loop {
                        tokio::select! {
                            permit = Arc::clone(&self.permits).acquire_owned() => break permit,
                            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                                tally(&mut stats, joined);
                            }
                        }
                    };
                    let Ok(permit) = permit else { break };
                    let dispatcher = Arc::clone(&self.dispatcher);

                    tasks.spawn(async move {
                        let result = dispatcher.handle(&event).await;
                        drop(permit);
                        report(&event.id, result)
                    });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    tally(&mut stats, joined);
                }
            }
        }

        tracing::info!(in_flight = tasks.len(), "change feed closed, draining");

        while let Some(joined) = tasks.join_next().await {
            tally(&mut stats, joined);
        }

        tracing::info!(
            sent = stats.sent,
            failed = stats.failed,
            skipped = stats.skipped,
            superseded = stats.superseded,
            errors = stats.errors,
            "relay stopped"
        );

        stats
    }
}

#[derive(Debug, Clone, Copy)]
enum Disposition {
    Sent,
    Failed,
    Skipped,
    Superseded,
    Error,
}

fn report(id: &RecordId, result: Result<Dispatched, DispatchError>) -> Disposition {
    match result {
        Ok(Dispatched::Sent { message_id }) => {
            tracing::info!(notification_id = %id, message_id = %message_id, "notification sent");
            Disposition::Sent
        }
        Ok(Dispatched::Superseded { message_id }) => {
            tracing::warn!(
                notification_id = %id,
                message_id = %message_id,
                "notification delivered but outcome already recorded"
            );
            Disposition::Superseded
        }
        Ok(Dispatched::AlreadyProcessed) => {
            tracing::debug!(notification_id = %id, "notification already processed");
            Disposition::Skipped
        }
        Err(DispatchError::InvalidDestination) => {
            tracing::warn!(notification_id = %id, "notification has no destination token");
            Disposition::Failed
        }
        Err(DispatchError::Delivery(e)) => {
            tracing::warn!(
                notification_id = %id,
                code = %e.code,
                error = %e,
                "notification delivery failed"
            );
            Disposition::Failed
        }
        Err(e @ (DispatchError::MissingPayload(_) | DispatchError::UnknownRecord(_))) => {
            tracing::error!(notification_id = %id, error = %e, "dropping event");
            Disposition::Error
        }
        Err(e @ DispatchError::Store(_)) => {
            tracing::error!(notification_id = %id, error = %e, "notification left pending");
            Disposition::Error
        }
    }
}

fn tally(stats: &mut RelayStats, joined: Result<Disposition, tokio::task::JoinError>) {
    match joined {
        Ok(Disposition::Sent) => stats.sent += 1,
        Ok(Disposition::Failed) => stats.failed += 1,
        Ok(Disposition::Skipped) => stats.skipped += 1,
        Ok(Disposition::Superseded) => stats.superseded += 1,
        Ok(Disposition::Error) => stats.errors += 1,
        Err(e) => {
            tracing::error!(error = %e, "dispatch task aborted");
            stats.errors += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::change_feed;
    use crate::testing::{MockGateway, pending};
    use relay_core::{
        DEFAULT_COLLECTION, DataPayload, DeliveryError, NewNotification, Notification,
        NotificationRecord, PayloadSchema, RecordCreated, Status,
    };
    use relay_storage::{MemoryStorage, NotificationStore};

    #[tokio::test]
    async fn test_relay_processes_every_event() {
        let store = MemoryStorage::new();
        let gateway = Arc::new(MockGateway::succeeding("m1"));
        let (publisher, subscription) = change_feed(16, DEFAULT_COLLECTION);

        let valid = pending(&store, "tok123");
        let blank = pending(&store, " ");
        let unstored = NotificationRecord::pending(
            RecordId::new("unstored"),
            NewNotification {
                destination_token: "tok456".into(),
                ..Default::default()
            },
            chrono::Utc::now(),
        );

        for record in [&valid, &blank, &unstored] {
            publisher
                .publish(RecordCreated::new(DEFAULT_COLLECTION, record.clone()))
                .await
                .unwrap();
        }
        publisher
            .publish(RecordCreated::without_data(
                DEFAULT_COLLECTION,
                RecordId::new("ghost"),
            ))
            .await
            .unwrap();
        publisher
            .publish(RecordCreated::new(DEFAULT_COLLECTION, valid.clone()))
            .await
            .unwrap();
        drop(publisher);

        let dispatcher = Dispatcher::new(
            store.clone(),
            SharedGateway(gateway.clone()),
            PayloadSchema::default(),
        );
        // One at a time, so the repeated event sees the stored outcome.
        let stats = Relay::new(dispatcher, 1).run(subscription).await;

        assert_eq!(
            stats,
            RelayStats {
                sent: 1,
                failed: 1,
                skipped: 1,
                superseded: 0,
                errors: 2,
            }
        );
        assert_eq!(gateway.calls().len(), 1);
        assert_eq!(store.outcome_writes(), 2);

        assert_eq!(store.get(&valid.id).unwrap().unwrap().status, Status::Sent);
        assert_eq!(store.get(&blank.id).unwrap().unwrap().status, Status::Failed);
        assert!(store.get(&unstored.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_flight_deliveries_are_capped() {
        let store = MemoryStorage::new();
        let peak = Arc::new(AtomicUsize::new(0));
        let gateway = SlowGateway {
            in_flight: AtomicUsize::new(0),
            peak: Arc::clone(&peak),
        };
        let (publisher, subscription) = change_feed(16, DEFAULT_COLLECTION);

        for _ in 0..6 {
            let record = pending(&store, "tok123");
            publisher
                .publish(RecordCreated::new(DEFAULT_COLLECTION, record))
                .await
                .unwrap();
        }
        drop(publisher);

        let dispatcher = Dispatcher::new(store, gateway, PayloadSchema::default());
        let stats = Relay::new(dispatcher, 2).run(subscription).await;

        assert_eq!(stats.sent, 6);
        let peak = peak.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak in-flight deliveries: {peak}");
    }

    struct SharedGateway(Arc<MockGateway>);

    impl Gateway for SharedGateway {
        async fn deliver(
            &self,
            token: &str,
            notification: &Notification,
            data: &DataPayload,
        ) -> Result<String, DeliveryError> {
            self.0.deliver(token, notification, data).await
        }
    }

    /// Holds every delivery open briefly and records the highest overlap.
    struct SlowGateway {
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
    }

    impl Gateway for SlowGateway {
        async fn deliver(
            &self,
            _token: &str,
            _notification: &Notification,
            _data: &DataPayload,
        ) -> Result<String, DeliveryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("m1".into())
        }
    }
}
