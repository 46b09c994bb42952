//! Reverse proxy forwarding.
//!
//! # Responsibilities
//! - Rewrite the inbound request onto the upstream (prefix stripped, `Host` adjusted)
//! - Send it over `http` or `https` with a bounded connect timeout and response timeout
//! - Hand the upstream status, headers and streaming body to the sink verbatim
//!
//! # Design Decisions
//! - At most one attempt; retries belong to whoever configures the upstream
//! - A failed forward never writes to the sink, the engine reports it
//! - Connect failures map to 502 and timeouts to 504
//! - The response timeout also bounds every gap in the upstream body; a
//!   stalled body ends in an error and the client connection is aborted

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode, Version};
use axum::response::Response;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tower_http::timeout::TimeoutBody;

use crate::dispatch::classify::StatusCarrier;
use crate::http::response::{ResponseSink, SinkError};
use crate::proxy::headers;
use crate::proxy::upstream::Upstream;
use crate::resilience::timeouts::{with_deadline, Elapsed};

/// Failure to forward a request upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("upstream unreachable: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),

    #[error("upstream request failed: {0}")]
    Request(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl StatusCarrier for UpstreamError {
    fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Connect(_) | UpstreamError::Request(_) => Some(StatusCode::BAD_GATEWAY),
            UpstreamError::Timeout(_) => Some(StatusCode::GATEWAY_TIMEOUT),
            UpstreamError::InvalidTarget { .. } | UpstreamError::Sink(_) => None,
        }
    }
}

impl From<Elapsed> for UpstreamError {
    fn from(elapsed: Elapsed) -> Self {
        UpstreamError::Timeout(elapsed.limit())
    }
}

/// Forwards a request to an upstream and writes the upstream response.
pub trait Forwarder: Send + Sync {
    /// Forward `request` to `upstream`.
    ///
    /// Resolves once the upstream response has been handed to `sink`. Fails
    /// without writing when the upstream is unreachable or too slow.
    fn forward<'a>(
        &'a self,
        request: Request<Body>,
        sink: &'a mut ResponseSink,
        upstream: &'a Upstream,
    ) -> impl Future<Output = Result<(), UpstreamError>> + Send + 'a;
}

/// Pooled client for upstream traffic.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build a client that reaches both `http` and `https` upstreams.
///
/// TLS uses rustls with the bundled webpki roots.
pub fn upstream_client(connect_timeout: Duration) -> UpstreamClient {
    let mut http = HttpConnector::new();
    http.set_connect_timeout(Some(connect_timeout));
    http.set_nodelay(true);
    http.enforce_http(false);

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(connector)
}

/// HTTP/1.1 forwarder backed by a pooled `hyper-util` client.
#[derive(Clone)]
pub struct ReverseProxyForwarder {
    client: UpstreamClient,
    response_timeout: Duration,
}

impl ReverseProxyForwarder {
    pub fn new(connect_timeout: Duration, response_timeout: Duration) -> Self {
        Self {
            client: upstream_client(connect_timeout),
            response_timeout,
        }
    }
}

/// Rewrite the request URI onto the upstream, in place.
pub fn rewrite_request(request: &mut Request<Body>, upstream: &Upstream) -> Result<(), UpstreamError> {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    *request.uri_mut() = upstream.target_uri(&path_and_query)?;
    *request.version_mut() = Version::HTTP_11;
    Ok(())
}

impl Forwarder for ReverseProxyForwarder {
    fn forward<'a>(
        &'a self,
        mut request: Request<Body>,
        sink: &'a mut ResponseSink,
        upstream: &'a Upstream,
    ) -> impl Future<Output = Result<(), UpstreamError>> + Send + 'a {
        async move {
            let original_host = request.headers().get(header::HOST).cloned();
            let peer = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0);

            rewrite_request(&mut request, upstream)?;
            headers::prepare_request(
                request.headers_mut(),
                upstream.authority(),
                original_host.as_ref(),
                peer,
            );

            tracing::debug!(target_uri = %request.uri(), "Forwarding request upstream");

            let response = with_deadline(self.response_timeout, self.client.request(request))
                .await?
                .map_err(|e| {
                    if e.is_connect() {
                        UpstreamError::Connect(e)
                    } else {
                        UpstreamError::Request(e)
                    }
                })?;

            let (mut parts, body) = response.into_parts();
            headers::prepare_response(
                parts.status,
                &mut parts.headers,
                upstream.authority(),
                original_host.as_ref(),
            );

            let body = TimeoutBody::new(self.response_timeout, body);
            sink.complete(Response::from_parts(parts, Body::new(body)))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_rewrite_mutates_request_in_place() {
        let upstream = Upstream::new("http://127.0.0.1:9000", "/api").unwrap();
        let mut request = Request::builder()
            .uri("/api/widgets?limit=5")
            .version(Version::HTTP_2)
            .body(Body::empty())
            .unwrap();

        rewrite_request(&mut request, &upstream).unwrap();

        assert_eq!(request.uri().to_string(), "http://127.0.0.1:9000/widgets?limit=5");
        assert_eq!(request.version(), Version::HTTP_11);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            UpstreamError::Timeout(Duration::from_secs(30)).status(),
            Some(StatusCode::GATEWAY_TIMEOUT)
        );
        let invalid = UpstreamError::InvalidTarget {
            target: "x".into(),
            reason: "y".into(),
        };
        assert_eq!(invalid.status(), None);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_leaves_sink_open() {
        // Bind then drop a listener so the port is known to refuse connections.
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let upstream = Upstream::new(&format!("http://{}", addr), "/api").unwrap();
        let forwarder = ReverseProxyForwarder::new(Duration::from_secs(2), Duration::from_secs(2));

        let mut sink = ResponseSink::new();
        let request = Request::builder().uri("/api/widgets").body(Body::empty()).unwrap();
        let err = forwarder.forward(request, &mut sink, &upstream).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Connect(_)), "got {err:?}");
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert!(sink.is_open());
    }

    #[tokio::test]
    async fn test_stalled_body_is_cut_off() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = [0u8; 1024];
            let _ = socket.read(&mut head).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nhello")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let upstream = Upstream::new(&format!("http://{}", addr), "/api").unwrap();
        let forwarder = ReverseProxyForwarder::new(Duration::from_secs(1), Duration::from_millis(300));

        let mut sink = ResponseSink::new();
        let request = Request::builder().uri("/api/stream").body(Body::empty()).unwrap();
        forwarder.forward(request, &mut sink, &upstream).await.unwrap();

        let response = sink.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let collected = tokio::time::timeout(
            Duration::from_secs(5),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("stalled upstream body was never cut off");
        assert!(collected.is_err());
    }
}
