//! Storage traits.

use relay_core::{NewNotification, NotificationRecord, Outcome, RecordId};

/// Notification record storage operations.
pub trait NotificationStore: Send + Sync {
    /// Insert a new pending record, assigning its id and creation time.
    fn insert(&self, new: &NewNotification) -> color_eyre::eyre::Result<NotificationRecord>;

    /// Get a record by id.
    fn get(&self, id: &RecordId) -> color_eyre::eyre::Result<Option<NotificationRecord>>;
}

/// Terminal outcome writes.
pub trait OutcomeStore: Send + Sync {
    /// Atomically write status, timestamp, and detail for a pending record.
    ///
    /// Returns `false` without writing when the record is missing or already
    /// terminal.
    fn record_outcome(&self, id: &RecordId, outcome: &Outcome) -> color_eyre::eyre::Result<bool>;
}

/// Combined storage trait.
pub trait AllStorage: NotificationStore + OutcomeStore {}

impl<T> AllStorage for T where T: NotificationStore + OutcomeStore {}
