//! HTTP edge server for server-rendered web applications.
//!
//! Each request goes through a fixed order of strategies: health check,
//! API proxy, static file, and server-side rendering when no file matches.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod routing;

// Strategies
pub mod assets;
pub mod health;
pub mod proxy;
pub mod render;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServerConfig;
pub use dispatch::{DispatchEngine, DispatcherConfig};
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
pub use render::{FragmentApp, RenderApp};
