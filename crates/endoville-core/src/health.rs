use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Handler for `GET /healthz`: liveness only.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Turn the outcome of a dependency probe into a readiness response.
///
/// `Ok` answers 200; `Err` answers 503 with the failing dependency named in the body.
pub fn readiness<E: std::fmt::Display>(dependency: &str, probe: Result<(), E>) -> Response {
    match probe {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!(dependency, error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "unavailable": dependency })),
            )
                .into_response()
        }
    }
}
