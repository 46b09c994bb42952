//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into a dispatch engine
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::dispatch::{DispatchEngine, DispatcherConfig, DispatcherConfigError};
use crate::http::EdgeServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::render::RenderApp;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid dispatcher configuration: {0}")]
    Dispatcher(#[from] DispatcherConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// An engine bound to its listener, not yet accepting.
pub struct BoundEdge {
    server: EdgeServer,
    listener: TcpListener,
}

impl BoundEdge {
    pub fn local_addr(&self) -> Result<SocketAddr, StartupError> {
        self.listener.local_addr().map_err(StartupError::Serve)
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        self.server
            .run(self.listener, shutdown)
            .await
            .map_err(StartupError::Serve)
    }
}

/// Build the engine for `config` and bind its listener.
pub async fn bind<A: RenderApp>(config: &ServerConfig, app: A) -> Result<BoundEdge, StartupError> {
    let dispatcher = DispatcherConfig::from_server_config(config)?;
    let engine = DispatchEngine::new(dispatcher, app);

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok(BoundEdge {
        server: EdgeServer::new(engine),
        listener,
    })
}

/// Run the edge server until `shutdown` is triggered.
pub async fn run<A: RenderApp>(
    config: &ServerConfig,
    app: A,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr = address
            .parse::<SocketAddr>()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        metrics::init_metrics(addr);
    }

    let edge = bind(config, app).await?;
    tracing::info!(address = %edge.local_addr()?, "Listening for connections");

    edge.serve(shutdown.subscribe()).await
}
