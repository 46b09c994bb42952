//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (request ID, body draining)
//!     → [dispatch engine decides the strategy]
//!     → response.rs (single terminal write per request)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{ResponseSink, SinkError};
pub use server::{build_router, EdgeServer};
