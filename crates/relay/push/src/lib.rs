//! Push Relay Delivery Gateways
//!
//! Single-attempt push delivery through Firebase Cloud Messaging or APNs.

mod apns;
mod client;
mod fcm;
mod traits;

pub use apns::*;
pub use client::*;
pub use fcm::*;
pub use traits::*;
