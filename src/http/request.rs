//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for correlation
//! - Read the request ID back for logging
//! - Drain request bodies before static serving and rendering
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` is kept, not replaced
//! - Draining discards chunks as they arrive; nothing is buffered

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use futures_util::StreamExt;
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::dispatch::classify::StatusCarrier;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID for log fields, or `"unknown"` when none was assigned.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
        })
        .unwrap_or("unknown")
        .to_string()
}

/// Reading the inbound body failed before it ended.
#[derive(Debug, Error)]
#[error("failed to read request body: {0}")]
pub struct DrainError(#[from] axum::Error);

impl StatusCarrier for DrainError {
    fn status(&self) -> Option<StatusCode> {
        Some(StatusCode::BAD_REQUEST)
    }
}

/// Consume the request body until it ends, discarding the data.
///
/// Returns the number of bytes discarded.
pub async fn drain_body(body: Body) -> Result<u64, DrainError> {
    let mut stream = body.into_data_stream();
    let mut discarded = 0u64;
    while let Some(chunk) = stream.next().await {
        discarded += chunk?.len() as u64;
    }
    Ok(discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use futures_util::stream;
    use std::io;

    #[test]
    fn test_make_request_uuid() {
        let request = Request::new(());
        let id = MakeRequestUuid.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }

    #[test]
    fn test_request_id_falls_back_to_header_then_unknown() {
        let request = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request_id(&request), "abc-123");
        assert_eq!(request_id(&Request::new(())), "unknown");
    }

    #[tokio::test]
    async fn test_drain_counts_bytes() {
        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]);
        assert_eq!(drain_body(Body::from_stream(chunks)).await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_drain_surfaces_stream_errors() {
        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"partial")),
            Err(io::Error::other("connection reset")),
        ]);
        assert!(drain_body(Body::from_stream(chunks)).await.is_err());
    }
}
