//! Terminal outcome writer.

use chrono::{DateTime, Utc};
use color_eyre::eyre::WrapErr as _;
use relay_core::{Outcome, RecordId};
use relay_storage::OutcomeStore;

/// Writes terminal delivery outcomes back to the record store.
///
/// Writes against a record that is already `sent` or `failed` are no-ops.
#[derive(Clone)]
pub struct OutcomeRecorder<S> {
    store: S,
}

impl<S> OutcomeRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: OutcomeStore> OutcomeRecorder<S> {
    /// Mark a record `sent`. Returns whether the write was applied.
    pub fn mark_sent(
        &self,
        id: &RecordId,
        message_id: &str,
        at: DateTime<Utc>,
    ) -> color_eyre::eyre::Result<bool> {
        self.record(
            id,
            Outcome::Sent {
                message_id: message_id.to_string(),
                at,
            },
        )
    }

    /// Mark a record `failed`. Returns whether the write was applied.
    pub fn mark_failed(
        &self,
        id: &RecordId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> color_eyre::eyre::Result<bool> {
        self.record(
            id,
            Outcome::Failed {
                detail: reason.to_string(),
                at,
            },
        )
    }

    fn record(&self, id: &RecordId, outcome: Outcome) -> color_eyre::eyre::Result<bool> {
        let applied = self
            .store
            .record_outcome(id, &outcome)
            .wrap_err_with(|| format!("failed to mark notification {} {}", id, outcome.status()))?;

        if !applied {
            tracing::debug!(
                notification_id = %id,
                status = %outcome.status(),
                "notification already terminal, outcome not written"
            );
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{NewNotification, Status};
    use relay_storage::{MemoryStorage, NotificationStore};

    #[test]
    fn test_second_mark_is_noop() {
        let store = MemoryStorage::new();
        let record = store.insert(&NewNotification::default()).unwrap();
        let recorder = OutcomeRecorder::new(store.clone());

        assert!(recorder.mark_sent(&record.id, "m1", Utc::now()).unwrap());
        assert!(!recorder.mark_failed(&record.id, "boom", Utc::now()).unwrap());

        let stored = store.get(&record.id).unwrap().unwrap();
        assert_eq!(stored.status, Status::Sent);
        assert_eq!(stored.message_id.as_deref(), Some("m1"));
        assert!(stored.error_detail.is_none());
    }
}
