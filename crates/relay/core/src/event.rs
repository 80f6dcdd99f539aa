//! Record-created change events.

use crate::{NotificationRecord, RecordId};

/// Default collection watched by the relay.
pub const DEFAULT_COLLECTION: &str = "push_notifications";

/// Emitted by the record store when a notification record is created.
///
/// The snapshot is optional: a feed may deliver an event whose data was lost
/// or never attached.
#[derive(Debug, Clone)]
pub struct RecordCreated {
    /// Logical collection the record was created in.
    pub collection: String,
    /// Identifier of the created record.
    pub id: RecordId,
    /// Full field set of the record at creation time.
    pub record: Option<NotificationRecord>,
}

impl RecordCreated {
    pub fn new(collection: impl Into<String>, record: NotificationRecord) -> Self {
        Self {
            collection: collection.into(),
            id: record.id.clone(),
            record: Some(record),
        }
    }

    /// An event that carries only the identifier.
    pub fn without_data(collection: impl Into<String>, id: RecordId) -> Self {
        Self {
            collection: collection.into(),
            id,
            record: None,
        }
    }
}
