//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default path prefix forwarded to the upstream API.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Root configuration for the edge server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static bundle location and serving options.
    pub site: SiteConfig,

    /// Optional upstream API backend.
    pub upstream: UpstreamConfig,

    /// Health endpoint settings.
    pub health: HealthConfig,

    /// Server-side rendering settings.
    pub render: RenderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Static site configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding the pre-built bundle. Usually given on the command line.
    pub document_root: String,

    /// `Cache-Control` value attached to files served from the document root.
    pub cache_control: Option<String>,
}

/// Upstream API backend.
///
/// Absence of an upstream is an explicit variant rather than an empty URL so that
/// every routing decision is made over a closed set of modes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UpstreamConfig {
    /// Serve the bundle only; nothing is proxied.
    #[default]
    Standalone,

    /// Forward requests under `path_prefix` to `base_url`.
    WithUpstream {
        /// Upstream base URL (scheme, host, port and optional base path).
        base_url: String,

        /// Path prefix stripped before forwarding.
        #[serde(default = "default_api_prefix")]
        path_prefix: String,
    },
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Path prefix answered by the health endpoint.
    pub path_prefix: String,

    /// Probe the upstream before reporting healthy.
    pub probe_upstream: bool,

    /// Path requested on the upstream when probing.
    pub probe_path: String,

    /// Probe timeout in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/healthz".to_string(),
            probe_upstream: false,
            probe_path: "/".to_string(),
            probe_timeout_secs: 5,
        }
    }
}

/// Server-side rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// HTML template file, relative to the document root.
    pub template: String,

    /// `id` of the element that receives the rendered markup.
    pub root_element_id: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            template: "index.html".to_string(),
            root_element_id: "root".to_string(),
        }
    }
}

/// Timeout configuration for upstream forwarding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to answer with a response head, in seconds.
    pub forward_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            forward_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Per-component log levels, keyed by tracing target
    /// (e.g. `"render_edge::proxy" = "debug"`).
    pub components: BTreeMap<String, String>,

    /// Emit JSON log lines instead of the human readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            components: BTreeMap::new(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
