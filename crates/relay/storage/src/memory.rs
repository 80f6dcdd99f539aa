//! In-memory storage implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use relay_core::{NewNotification, NotificationRecord, Outcome, RecordId};

use crate::traits::*;

/// Process-local storage with the same semantics as [`crate::SqliteStorage`].
///
/// Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<RecordId, NotificationRecord>>>,
    outcome_writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a record as-is, replacing any record with the same id.
    pub fn put(&self, record: NotificationRecord) -> color_eyre::eyre::Result<()> {
        self.lock()?.insert(record.id.clone(), record);
        Ok(())
    }

    /// Number of outcome writes attempted against this store.
    pub fn outcome_writes(&self) -> usize {
        self.outcome_writes.load(Ordering::SeqCst)
    }

    fn lock(
        &self,
    ) -> color_eyre::eyre::Result<MutexGuard<'_, HashMap<RecordId, NotificationRecord>>> {
        self.records
            .lock()
            .map_err(|_| color_eyre::eyre::eyre!("memory storage lock poisoned"))
    }
}

impl NotificationStore for MemoryStorage {
    fn insert(&self, new: &NewNotification) -> color_eyre::eyre::Result<NotificationRecord> {
        let id = RecordId::new(uuid::Uuid::new_v4().to_string());
        let record = NotificationRecord::pending(id, new.clone(), chrono::Utc::now());

        self.lock()?.insert(record.id.clone(), record.clone());

        Ok(record)
    }

    fn get(&self, id: &RecordId) -> color_eyre::eyre::Result<Option<NotificationRecord>> {
        Ok(self.lock()?.get(id).cloned())
    }
}

impl OutcomeStore for MemoryStorage {
    fn record_outcome(&self, id: &RecordId, outcome: &Outcome) -> color_eyre::eyre::Result<bool> {
        self.outcome_writes.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .lock()?
            .get_mut(id)
            .is_some_and(|record| record.apply(outcome)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::Status;

    #[test]
    fn test_outcome_is_written_once() {
        let storage = MemoryStorage::new();
        let record = storage
            .insert(&NewNotification {
                destination_token: "tok".into(),
                ..Default::default()
            })
            .unwrap();

        let at = chrono::Utc::now();
        assert!(
            storage
                .record_outcome(
                    &record.id,
                    &Outcome::Failed {
                        detail: "quota exceeded".into(),
                        at,
                    },
                )
                .unwrap()
        );
        assert!(
            !storage
                .record_outcome(
                    &record.id,
                    &Outcome::Sent {
                        message_id: "m1".into(),
                        at,
                    },
                )
                .unwrap()
        );

        let stored = storage.get(&record.id).unwrap().unwrap();
        assert_eq!(stored.status, Status::Failed);
        assert!(stored.message_id.is_none());
        assert_eq!(storage.outcome_writes(), 2);
    }

    #[test]
    fn test_clones_share_records() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        let record = storage.insert(&NewNotification::default()).unwrap();
        assert!(other.get(&record.id).unwrap().is_some());
    }
}
