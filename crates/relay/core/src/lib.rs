//! Push Relay Core Types
//!
//! Notification records, record-created events, and the delivery payload
//! shared by the store, the gateways, and the dispatcher.

mod delivery;
mod event;
mod payload;
mod record;

pub use delivery::*;
pub use event::*;
pub use payload::*;
pub use record::*;
