//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, at startup
//! - Translate the configured default and per-component levels into filter directives
//!
//! # Design Decisions
//! - Components are tracing targets (module paths); no global logger object
//! - `RUST_LOG` wins over the configuration when set
//! - JSON format for production, pretty format for development

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the `EnvFilter` directive string for a configuration.
///
/// ```
/// use render_edge::config::ObservabilityConfig;
/// use render_edge::observability::logging::filter_directives;
///
/// let mut config = ObservabilityConfig::default();
/// config.components.insert("render_edge::proxy".into(), "debug".into());
/// assert_eq!(filter_directives(&config), "info,render_edge::proxy=debug");
/// ```
pub fn filter_directives(config: &ObservabilityConfig) -> String {
    let mut directives = vec![config.log_level.clone()];
    directives.extend(
        config
            .components
            .iter()
            .map(|(target, level)| format!("{}={}", target, level)),
    );
    directives.join(",")
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}
