//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: PORT, BACKEND_*)
//!     → command line (document root, bind address; wins over both)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated)
//!     → DispatcherConfig (immutable, shared via Arc with every request)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve, CommandLine, ConfigError, OverrideWarning};
pub use schema::{
    HealthConfig, ListenerConfig, ObservabilityConfig, RenderConfig, ServerConfig, SiteConfig,
    TimeoutConfig, UpstreamConfig,
};
