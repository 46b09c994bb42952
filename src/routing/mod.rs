//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → decision.rs (fixed precedence over the routing table)
//!     → matcher.rs (path prefix checks)
//!     → Return: HealthCheck | Proxy(upstream) | StaticAsset | Unmatched
//!
//! Table compilation (at startup):
//!     ServerConfig
//!     → health prefix + UpstreamMode
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Table compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same decision

pub mod decision;
pub mod matcher;

pub use decision::{RoutingDecision, RoutingTable, UpstreamMode};
pub use matcher::PathPrefix;
