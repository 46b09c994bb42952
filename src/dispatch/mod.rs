//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! axum fallback handler
//!     → engine.rs (routing decision, strategy cascade, completion guard)
//!     → classify.rs (failure → status + terse message)
//!     → ResponseSink → client
//! ```
//!
//! # Design Decisions
//! - One terminal write per request, enforced by the sink and the guard
//! - Only a static miss falls through to rendering; every other failure is terminal
//! - Client bodies never carry failure details, the log does

pub mod classify;
pub mod config;
pub mod engine;

pub use classify::{classify, ClassifiedError, StatusCarrier, UNKNOWN_STATUS};
pub use config::{DispatcherConfig, DispatcherConfigError, ProbeSettings};
pub use engine::DispatchEngine;
