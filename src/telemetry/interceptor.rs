use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{extract::extract_fields, LogEntry, TelemetryPipeline};
use crate::error::AppError;

/// Largest request body the interceptor will buffer
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Telemetry middleware
///
/// Requests to the monitored path must carry a JSON body; the body is
/// buffered, replayed to the handler, and the handler's response is buffered
/// and rebuilt byte-for-byte before it is returned. Every other path passes
/// straight through.
pub async fn telemetry_middleware(
    State(pipeline): State<Arc<TelemetryPipeline>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !pipeline.is_monitored(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();
    let request_body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;

    if let Err(e) = serde_json::from_slice::<serde_json::Value>(&request_body) {
        tracing::warn!(error = %e, "Request body is not valid JSON");
        return Err(AppError::InvalidJson(e.to_string()));
    }

    let req = Request::from_parts(parts, Body::from(request_body.clone()));
    let response = next.run(req).await;

    let (parts, body) = response.into_parts();
    let response_body = to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to buffer handler response");
        AppError::InternalError("Failed to read response body".to_string())
    })?;

    if parts.status.is_success() {
        let (predicted_tip, words_count) = extract_fields(&request_body, &response_body);
        pipeline
            .record(LogEntry::new(predicted_tip, words_count))
            .await;
    } else {
        tracing::debug!(status = %parts.status, "Handler did not succeed, no telemetry recorded");
    }

    Ok(Response::from_parts(parts, Body::from(response_body)))
}
