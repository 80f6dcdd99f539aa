//! Per-event notification dispatch.

use relay_core::{DeliveryError, PayloadSchema, RecordCreated, RecordId};
use relay_push::Gateway;
use relay_storage::AllStorage;

use crate::OutcomeRecorder;

/// Error detail recorded for records without a usable destination token.
pub const INVALID_DESTINATION: &str = "invalid destination token";

/// Successful or skipped dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Delivered and marked `sent`.
    Sent { message_id: String },
    /// Delivered, but another invocation recorded the outcome first. The
    /// stored outcome was left untouched.
    Superseded { message_id: String },
    /// The record was already terminal; nothing was done.
    AlreadyProcessed,
}

/// Why a dispatch did not end in `sent`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The event carried no record data; nothing was updated.
    #[error("event for notification {0} carried no record")]
    MissingPayload(RecordId),

    /// The event names a record the store does not hold; nothing was sent.
    #[error("notification {0} not found in store")]
    UnknownRecord(RecordId),

    /// The record was marked `failed` without contacting the gateway.
    #[error("invalid destination token")]
    InvalidDestination,

    /// The gateway rejected the delivery; the record was marked `failed`.
    #[error("delivery failed: {0}")]
    Delivery(DeliveryError),

    /// The store could not be read or written; the record is still `pending`.
    #[error("{0:#}")]
    Store(color_eyre::eyre::Report),
}

/// Validates a created record, delivers it, and records the outcome.
///
/// Holds no state between invocations.
pub struct Dispatcher<S, G> {
    recorder: OutcomeRecorder<S>,
    gateway: G,
    schema: PayloadSchema,
}

impl<S, G> Dispatcher<S, G> {
    pub fn new(store: S, gateway: G, schema: PayloadSchema) -> Self {
        Self {
            recorder: OutcomeRecorder::new(store),
            gateway,
            schema,
        }
    }
}

impl<S: AllStorage, G: Gateway> Dispatcher<S, G> {
    /// Handle one record-created event.
    ///
    /// The stored status decides whether the record is still deliverable;
    /// the event's copy of the record only supplies its content.
    pub async fn handle(&self, event: &RecordCreated) -> Result<Dispatched, DispatchError> {
        let record = event
            .record
            .as_ref()
            .ok_or_else(|| DispatchError::MissingPayload(event.id.clone()))?;

        let current = self
            .recorder
            .store()
            .get(&record.id)
            .map_err(DispatchError::Store)?
            .ok_or_else(|| DispatchError::UnknownRecord(record.id.clone()))?;

        if current.status.is_terminal() || record.status.is_terminal() {
            return Ok(Dispatched::AlreadyProcessed);
        }

        let Some(token) = record.valid_destination() else {
            let applied = self
                .recorder
                .mark_failed(&record.id, INVALID_DESTINATION, chrono::Utc::now())
                .map_err(DispatchError::Store)?;
            if !applied {
                return Ok(Dispatched::AlreadyProcessed);
            }
            return Err(DispatchError::InvalidDestination);
        };

        let notification = self.schema.notification(record);
        let data = self.schema.data(record);

        match self.gateway.deliver(token, &notification, &data).await {
            Ok(message_id) => {
                let applied = self
                    .recorder
                    .mark_sent(&record.id, &message_id, chrono::Utc::now())
                    .map_err(DispatchError::Store)?;
                if applied {
                    Ok(Dispatched::Sent { message_id })
                } else {
                    Ok(Dispatched::Superseded { message_id })
                }
            }
            Err(e) => {
                let applied = self
                    .recorder
                    .mark_failed(&record.id, &e.to_string(), chrono::Utc::now())
                    .map_err(DispatchError::Store)?;
                if !applied {
                    return Ok(Dispatched::AlreadyProcessed);
                }
                Err(DispatchError::Delivery(e))
            }
        }
    }
}
