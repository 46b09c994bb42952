//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the dispatch engine as the only handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::assets::AssetResolver;
use crate::dispatch::DispatchEngine;
use crate::http::request::MakeRequestUuid;
use crate::proxy::Forwarder;
use crate::render::RenderApp;

/// HTTP server for the edge.
pub struct EdgeServer {
    router: Router,
}

impl EdgeServer {
    /// Create a new HTTP server around a dispatch engine.
    pub fn new<A, S, F>(engine: DispatchEngine<A, S, F>) -> Self
    where
        A: RenderApp,
        S: AssetResolver + 'static,
        F: Forwarder + 'static,
    {
        Self {
            router: build_router(Arc::new(engine)),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// Every request, whatever its method or target, reaches the engine.
pub fn build_router<A, S, F>(engine: Arc<DispatchEngine<A, S, F>>) -> Router
where
    A: RenderApp,
    S: AssetResolver + 'static,
    F: Forwarder + 'static,
{
    Router::new()
        .fallback(dispatch_handler::<A, S, F>)
        .with_state(engine)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

async fn dispatch_handler<A, S, F>(
    State(engine): State<Arc<DispatchEngine<A, S, F>>>,
    request: Request<Body>,
) -> Response
where
    A: RenderApp,
    S: AssetResolver + 'static,
    F: Forwarder + 'static,
{
    engine.handle(request).await
}
