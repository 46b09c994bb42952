//! Runtime configuration of the dispatch engine.

use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::{ServerConfig, UpstreamConfig};
use crate::proxy::{Upstream, UpstreamError};
use crate::render::PageRenderFallback;
use crate::routing::{RoutingTable, UpstreamMode};

/// The server configuration could not be turned into a dispatcher.
#[derive(Debug, Error)]
pub enum DispatcherConfigError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("site.cache_control {0:?} is not a valid header value")]
    CacheControl(String),
}

/// Optional upstream probing from the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub path: String,
    pub timeout: Duration,
}

/// Everything the engine needs, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub document_root: PathBuf,
    pub routing: RoutingTable,
    pub probe: Option<ProbeSettings>,
    pub connect_timeout: Duration,
    pub forward_timeout: Duration,
    pub renderer: PageRenderFallback,
    pub cache_control: Option<HeaderValue>,
}

impl DispatcherConfig {
    /// Standalone configuration with default health prefix, template and timeouts.
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        let defaults = ServerConfig::default();
        Self {
            document_root: document_root.into(),
            routing: RoutingTable::new(defaults.health.path_prefix, UpstreamMode::Standalone),
            probe: None,
            connect_timeout: Duration::from_secs(defaults.timeouts.connect_secs),
            forward_timeout: Duration::from_secs(defaults.timeouts.forward_secs),
            renderer: PageRenderFallback::default(),
            cache_control: None,
        }
    }

    /// Enable proxying to `upstream`, keeping the current health prefix.
    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        let health = self.routing.health_prefix().as_str().to_string();
        self.routing = RoutingTable::new(health, UpstreamMode::WithUpstream(upstream));
        self
    }

    pub fn with_forward_timeout(mut self, timeout: Duration) -> Self {
        self.forward_timeout = timeout;
        self
    }

    pub fn with_probe(mut self, probe: ProbeSettings) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Build from a validated server configuration.
    pub fn from_server_config(config: &ServerConfig) -> Result<Self, DispatcherConfigError> {
        let upstream = match &config.upstream {
            UpstreamConfig::Standalone => UpstreamMode::Standalone,
            UpstreamConfig::WithUpstream { base_url, path_prefix } => {
                UpstreamMode::WithUpstream(Upstream::new(base_url, path_prefix.clone())?)
            }
        };

        let cache_control = config
            .site
            .cache_control
            .as_deref()
            .map(|value| {
                HeaderValue::from_str(value)
                    .map_err(|_| DispatcherConfigError::CacheControl(value.to_string()))
            })
            .transpose()?;

        let probe = config.health.probe_upstream.then(|| ProbeSettings {
            path: config.health.probe_path.clone(),
            timeout: Duration::from_secs(config.health.probe_timeout_secs),
        });

        Ok(Self {
            document_root: PathBuf::from(&config.site.document_root),
            routing: RoutingTable::new(config.health.path_prefix.clone(), upstream),
            probe,
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            forward_timeout: Duration::from_secs(config.timeouts.forward_secs),
            renderer: PageRenderFallback::new(
                config.render.template.clone(),
                config.render.root_element_id.clone(),
            ),
            cache_control,
        })
    }
}
