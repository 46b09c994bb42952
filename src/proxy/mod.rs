//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Request under the API prefix
//!     → upstream.rs (strip prefix, build absolute upstream URI)
//!     → headers.rs (Host, X-Forwarded-*, hop-by-hop)
//!     → forwarder.rs (hyper-util client, deadline)
//!     → headers.rs (hop-by-hop, Location rewrite)
//!     → ResponseSink
//! ```

pub mod forwarder;
pub mod headers;
pub mod upstream;

pub use forwarder::{Forwarder, ReverseProxyForwarder, UpstreamError};
pub use upstream::Upstream;
