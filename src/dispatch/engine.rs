//! Request dispatch engine.
//!
//! # Responsibilities
//! - Pick the strategy for each request (health, proxy, static, render)
//! - Cascade a static miss into server-side rendering
//! - Classify every other failure into a terse error response
//! - Guarantee exactly one terminal response per request
//!
//! # Request Flow
//! ```text
//! handle(request)
//!     → RoutingTable::decide(path)
//!     ├─ HealthCheck → drain body → HealthChecker → 200/503 JSON
//!     ├─ Proxy       → Forwarder (no drain, body streamed upstream)
//!     │                  └─ failure → classify → error response
//!     ├─ StaticAsset → drain body → AssetResolver
//!     │                  ├─ NotFound → PageRenderFallback → 200 HTML | 500
//!     │                  └─ other failure → classify → error response
//!     └─ Unmatched   → 404
//!     → completion guard (sink still open → warn, abort connection)
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use thiserror::Error;
use tracing::Instrument;

use crate::assets::{AssetResolver, StaticAssetResolver};
use crate::dispatch::classify::{classify, ClassifiedError, StatusCarrier, INTERNAL_SERVER_ERROR};
use crate::dispatch::config::DispatcherConfig;
use crate::health::{HealthChecker, UpstreamProbe};
use crate::http::request::{drain_body, request_id};
use crate::http::response::{abandoned_response, html_response, text_response, ResponseSink};
use crate::observability::metrics;
use crate::proxy::{Forwarder, ReverseProxyForwarder};
use crate::render::RenderApp;
use crate::routing::RoutingDecision;

/// The request target cannot be routed (not an origin-form path).
#[derive(Debug, Error)]
#[error("request target {0:?} is not a path")]
pub struct UnroutableTarget(String);

impl StatusCarrier for UnroutableTarget {
    fn status(&self) -> Option<StatusCode> {
        Some(StatusCode::NOT_FOUND)
    }
}

/// Dispatches requests over health check, upstream proxy, static files and
/// server-side rendering.
///
/// `A` is the application handle given to the renderer; the static resolver
/// and forwarder are replaceable so each strategy can be exercised alone.
pub struct DispatchEngine<A, S = StaticAssetResolver, F = ReverseProxyForwarder> {
    config: Arc<DispatcherConfig>,
    app: Arc<A>,
    assets: S,
    forwarder: F,
    health: HealthChecker,
}

impl<A: RenderApp> DispatchEngine<A> {
    /// Engine with the file-serving resolver and the HTTP forwarder.
    pub fn new(config: DispatcherConfig, app: A) -> Self {
        let mut assets = StaticAssetResolver::new(&config.document_root);
        if let Some(value) = &config.cache_control {
            assets = assets.with_cache_control(value.clone());
        }
        let forwarder = ReverseProxyForwarder::new(config.connect_timeout, config.forward_timeout);
        Self::with_collaborators(config, Arc::new(app), assets, forwarder)
    }
}

impl<A, S, F> DispatchEngine<A, S, F>
where
    A: RenderApp,
    S: AssetResolver,
    F: Forwarder,
{
    pub fn with_collaborators(config: DispatcherConfig, app: Arc<A>, assets: S, forwarder: F) -> Self {
        let health = match &config.probe {
            Some(probe) => HealthChecker::probing(UpstreamProbe::new(probe.path.clone(), probe.timeout)),
            None => HealthChecker::passive(),
        };

        match config.routing.upstream().upstream() {
            Some(upstream) => tracing::info!(
                document_root = %config.document_root.display(),
                api_prefix = %upstream.prefix(),
                upstream = %upstream,
                "Enabled document root with API proxy"
            ),
            None => tracing::info!(
                document_root = %config.document_root.display(),
                "Enabled document root"
            ),
        }

        Self {
            config: Arc::new(config),
            app,
            assets,
            forwarder,
            health,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Handle one request and return its single terminal response.
    ///
    /// Never panics: a panic inside a strategy is logged and the request is
    /// closed by the completion guard.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let decision = self.config.routing.decide(&path);
        let route = decision.label();

        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id(&request),
            method = %method,
            path = %path,
            route,
        );

        let mut sink = ResponseSink::new();
        let outcome = AssertUnwindSafe(
            self.dispatch_decided(decision, request, &mut sink)
                .instrument(span.clone()),
        )
        .catch_unwind()
        .await;

        span.in_scope(|| {
            if let Err(panic) = outcome {
                tracing::error!(panic = %panic_message(&*panic), "Unexpected panic in request handler");
            }

            match sink.into_response() {
                Some(response) => {
                    metrics::record_request(route, response.status().as_u16(), start);
                    response
                }
                None => {
                    tracing::warn!(
                        "\"{} {}\": Warning! Request handler did not close the response.",
                        method,
                        path
                    );
                    metrics::record_incomplete_response(route);
                    abandoned_response()
                }
            }
        })
    }

    /// Route `request` and write its outcome into `sink`.
    pub async fn dispatch(&self, request: Request<Body>, sink: &mut ResponseSink) {
        let path = request.uri().path().to_string();
        let decision = self.config.routing.decide(&path);
        self.dispatch_decided(decision, request, sink).await;
    }

    async fn dispatch_decided(
        &self,
        decision: RoutingDecision<'_>,
        request: Request<Body>,
        sink: &mut ResponseSink,
    ) {
        let path = request.uri().path().to_string();

        match decision {
            RoutingDecision::HealthCheck => {
                if let Err(e) = drain_body(request.into_body()).await {
                    return write_error(sink, &path, classify(e));
                }
                let report = self.health.report(self.config.routing.upstream()).await;
                write(sink, &path, report.into_response());
            }

            RoutingDecision::Proxy(upstream) => {
                tracing::debug!(upstream = %upstream, "Routing request to upstream");
                let forwarded = self.forwarder.forward(request, sink, upstream).await;
                match forwarded {
                    Ok(()) => log_completed(sink, &path),
                    Err(e) => write_error(sink, &path, classify(e)),
                }
            }

            RoutingDecision::StaticAsset => {
                let target = request
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| path.clone());

                let (parts, body) = request.into_parts();
                if let Err(e) = drain_body(body).await {
                    return write_error(sink, &path, classify(e));
                }
                let request = Request::from_parts(parts, Body::empty());

                let served = self.assets.serve(request, sink).await;
                match served {
                    Ok(()) => log_completed(sink, &path),
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(target = %target, "No static asset, rendering on the server");
                        metrics::record_render_fallback();
                        self.render(sink, &path, &target).await;
                    }
                    Err(e) => write_error(sink, &path, classify(e)),
                }
            }

            RoutingDecision::Unmatched => {
                write_error(sink, &path, classify(UnroutableTarget(path.clone())));
            }
        }
    }

    async fn render(&self, sink: &mut ResponseSink, path: &str, target: &str) {
        let rendered = self
            .config
            .renderer
            .render(target, &self.config.document_root, &self.app)
            .await;

        match rendered {
            Ok(document) => write(sink, path, html_response(document)),
            Err(e) => write_error(sink, path, classify(e).with_message(INTERNAL_SERVER_ERROR)),
        }
    }
}

/// Terminal write with completion logging. A second write is dropped.
fn write(sink: &mut ResponseSink, path: &str, response: Response) {
    let status = response.status();
    match sink.complete(response) {
        Ok(()) => tracing::info!(path = %path, status = status.as_u16(), "Response completed"),
        Err(e) => tracing::warn!(
            path = %path,
            discarded_status = status.as_u16(),
            error = %e,
            "Discarded second terminal write"
        ),
    }
}

fn write_error(sink: &mut ResponseSink, path: &str, error: ClassifiedError) {
    tracing::error!(
        status_code = error.status_code,
        error = %error.cause,
        "Error {}",
        error.status_code
    );
    let status = error.response_status();
    write(sink, path, text_response(status, error.message));
}

/// Log a response written by a collaborator.
fn log_completed(sink: &ResponseSink, path: &str) {
    if let Some(status) = sink.status() {
        tracing::info!(path = %path, status = status.as_u16(), "Response completed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
