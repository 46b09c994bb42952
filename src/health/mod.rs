//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Request under the health prefix
//!     → mod.rs (HealthChecker: which upstream mode, probing on or off)
//!     → probe.rs (optional GET to the upstream, bounded by a deadline)
//!     → report.rs ({"ok": bool, "upstream": state} as JSON)
//! ```
//!
//! # Design Decisions
//! - The document always says whether the upstream was probed
//! - Without probing the edge reports only its own liveness
//! - An unreachable upstream turns the report into a 503

pub mod probe;
pub mod report;

pub use probe::UpstreamProbe;
pub use report::{HealthReport, UpstreamHealth};

use crate::routing::UpstreamMode;

/// Produces health reports for the edge server.
#[derive(Clone, Default)]
pub struct HealthChecker {
    probe: Option<UpstreamProbe>,
}

impl HealthChecker {
    /// Report liveness only.
    pub fn passive() -> Self {
        Self { probe: None }
    }

    /// Probe the upstream, when one is configured, before reporting.
    pub fn probing(probe: UpstreamProbe) -> Self {
        Self { probe: Some(probe) }
    }

    pub async fn report(&self, mode: &UpstreamMode) -> HealthReport {
        let upstream = match (mode, &self.probe) {
            (UpstreamMode::Standalone, _) => UpstreamHealth::Disabled,
            (UpstreamMode::WithUpstream(_), None) => UpstreamHealth::NotProbed,
            (UpstreamMode::WithUpstream(upstream), Some(probe)) => probe.check(upstream).await,
        };
        HealthReport::new(upstream)
    }
}
