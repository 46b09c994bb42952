//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch engine produces:
//!     → logging.rs (structured log events, per-component levels)
//!     → metrics.rs (counters, histograms)
//!
//! Request IDs (http::request) are attached to every dispatch log line.
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
