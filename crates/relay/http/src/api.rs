//! REST API handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use relay_core::{NewNotification, RecordId};
use relay_service::Producer;
use relay_storage::NotificationStore;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Queue a notification for delivery.
pub async fn create_notification<S>(
    State(producer): State<Producer<S>>,
    Json(new): Json<NewNotification>,
) -> Response
where
    S: NotificationStore,
{
    match producer.submit(new).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to queue notification");
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to queue notification")
        }
    }
}

/// Get a notification and its delivery status.
pub async fn get_notification<S>(
    State(producer): State<Producer<S>>,
    Path(id): Path<String>,
) -> Response
where
    S: NotificationStore,
{
    let id = RecordId::new(id);

    match producer.get(&id) {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => error(
            StatusCode::NOT_FOUND,
            format!("notification {} not found", id),
        ),
        Err(e) => {
            tracing::error!(notification_id = %id, error = %e, "failed to get notification");
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to get notification")
        }
    }
}
