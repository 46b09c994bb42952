//! Routing decision.
//!
//! # Responsibilities
//! - Hold the compiled routing table (health prefix, upstream mode)
//! - Decide which strategy handles a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Pure: the same path always yields the same decision
//! - Fixed precedence: health check, then proxy, then static

use crate::proxy::Upstream;
use crate::routing::matcher::PathPrefix;

/// Whether an upstream API is configured.
#[derive(Debug, Clone)]
pub enum UpstreamMode {
    Standalone,
    WithUpstream(Upstream),
}

impl UpstreamMode {
    pub fn upstream(&self) -> Option<&Upstream> {
        match self {
            UpstreamMode::Standalone => None,
            UpstreamMode::WithUpstream(upstream) => Some(upstream),
        }
    }
}

/// Strategy selected for a request.
#[derive(Debug, Clone, Copy)]
pub enum RoutingDecision<'a> {
    /// Answer from the health endpoint.
    HealthCheck,
    /// Forward to the upstream.
    Proxy(&'a Upstream),
    /// Try the document root, render on miss.
    StaticAsset,
    /// The request target is not an origin-form path (e.g. `OPTIONS *`).
    Unmatched,
}

impl RoutingDecision<'_> {
    /// Short name used in logs and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingDecision::HealthCheck => "health",
            RoutingDecision::Proxy(_) => "proxy",
            RoutingDecision::StaticAsset => "static",
            RoutingDecision::Unmatched => "unmatched",
        }
    }
}

/// Compiled routing configuration.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    health: PathPrefix,
    upstream: UpstreamMode,
}

impl RoutingTable {
    pub fn new(health_prefix: impl Into<String>, upstream: UpstreamMode) -> Self {
        Self {
            health: PathPrefix::new(health_prefix),
            upstream,
        }
    }

    pub fn upstream(&self) -> &UpstreamMode {
        &self.upstream
    }

    pub fn health_prefix(&self) -> &PathPrefix {
        &self.health
    }

    /// Select the strategy for `path`.
    pub fn decide(&self, path: &str) -> RoutingDecision<'_> {
        if self.health.matches(path) {
            return RoutingDecision::HealthCheck;
        }

        if let UpstreamMode::WithUpstream(upstream) = &self.upstream {
            if upstream.prefix().matches(path) {
                return RoutingDecision::Proxy(upstream);
            }
        }

        if path.starts_with('/') {
            RoutingDecision::StaticAsset
        } else {
            RoutingDecision::Unmatched
        }
    }
}
