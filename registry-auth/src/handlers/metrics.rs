use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

pub async fn metrics() -> impl IntoResponse {
    match crate::services::metrics::gather() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
