//! Upstream health probing.
//!
//! # Responsibilities
//! - Send one GET to the upstream when the health endpoint is asked
//! - Classify the outcome as reachable or unreachable

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};

use crate::health::report::UpstreamHealth;
use crate::proxy::forwarder::{upstream_client, UpstreamClient};
use crate::proxy::Upstream;
use crate::resilience::timeouts::with_deadline;

/// Probes the upstream on demand.
#[derive(Clone)]
pub struct UpstreamProbe {
    client: UpstreamClient,
    path: String,
    timeout: Duration,
}

impl UpstreamProbe {
    /// `path` is an inbound-style path and is rewritten like a proxied request.
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: upstream_client(timeout),
            path: path.into(),
            timeout,
        }
    }

    /// Reachable when the upstream answers without a 5xx status in time.
    pub async fn check(&self, upstream: &Upstream) -> UpstreamHealth {
        let uri = match upstream.target_uri(&self.path) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build health probe URI");
                return UpstreamHealth::Unreachable;
            }
        };

        let request = match Request::builder()
            .method("GET")
            .uri(uri.clone())
            .header(header::HOST, upstream.authority().as_str())
            .header(header::USER_AGENT, "render-edge-health-probe")
            .body(Body::empty())
        {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build health probe request");
                return UpstreamHealth::Unreachable;
            }
        };

        match with_deadline(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if !response.status().is_server_error() => UpstreamHealth::Reachable,
            Ok(Ok(response)) => {
                tracing::warn!(uri = %uri, status = %response.status(), "Health probe failed: server error status");
                UpstreamHealth::Unreachable
            }
            Ok(Err(e)) => {
                tracing::warn!(uri = %uri, error = %e, "Health probe failed: connection error");
                UpstreamHealth::Unreachable
            }
            Err(elapsed) => {
                tracing::warn!(uri = %uri, limit = ?elapsed.limit(), "Health probe failed: timeout");
                UpstreamHealth::Unreachable
            }
        }
    }
}
