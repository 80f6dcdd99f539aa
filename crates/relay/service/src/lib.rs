//! Push Relay Service Layer
//!
//! Turns record-created events into delivery attempts and recorded outcomes.

mod dispatcher;
mod feed;
mod producer;
mod recorder;
mod relay;

#[cfg(test)]
mod testing;

pub use dispatcher::*;
pub use feed::*;
pub use producer::Producer;
pub use recorder::OutcomeRecorder;
pub use relay::*;
