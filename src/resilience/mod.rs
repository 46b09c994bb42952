//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream (forward or health probe):
//!     → timeouts.rs (enforce response deadline)
//!     → On expiry: UpstreamError::Timeout, classified as 504
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - No retries: a failed forward is reported once
//! - Connect timeouts live on the connector, response deadlines here

pub mod timeouts;
