//! Push Relay HTTP Layer
//!
//! Axum handlers for submitting notifications and reading their status.

mod api;
mod middleware;

pub use api::*;
pub use middleware::*;

use axum::Router;
use relay_service::Producer;

/// Create the API router.
pub fn api_router<S>(producer: Producer<S>) -> Router
where
    S: relay_storage::NotificationStore + Clone + 'static,
{
    use axum::routing::{get, post};

    Router::new()
        .route("/healthz", get(api::health))
        .route("/v1/notifications", post(api::create_notification::<S>))
        .route("/v1/notifications/{id}", get(api::get_notification::<S>))
        .with_state(producer)
}
