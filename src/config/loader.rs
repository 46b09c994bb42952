//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ServerConfig, UpstreamConfig, DEFAULT_API_PREFIX};
use crate::config::validation::{validate_config, ValidationError};

/// Listening port override.
pub const ENV_PORT: &str = "PORT";
/// Default log level override.
pub const ENV_LOG_LEVEL: &str = "BACKEND_LOG_LEVEL";
/// Enables proxying of the API prefix to this URL.
pub const ENV_API_PROXY_URL: &str = "BACKEND_API_PROXY_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// An environment value that was present but could not be applied.
///
/// Overrides are resolved before logging exists, so these are handed back to
/// the caller instead of being traced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideWarning {
    #[error("ignoring non-numeric PORT value {0:?}")]
    InvalidPort(String),
}

/// Settings given on the command line. These take precedence over both the
/// file and the environment.
#[derive(Debug, Default, Clone)]
pub struct CommandLine {
    pub document_root: Option<String>,
    pub bind_address: Option<String>,
}

impl CommandLine {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(root) = &self.document_root {
            config.site.document_root = root.clone();
        }
        if let Some(bind) = &self.bind_address {
            config.listener.bind_address = bind.clone();
        }
    }
}

/// Load, override from the process environment and validate a TOML file.
pub fn load_config(path: &Path) -> Result<(ServerConfig, Vec<OverrideWarning>), ConfigError> {
    resolve(read_config(path)?, &CommandLine::default(), |key| {
        std::env::var(key).ok()
    })
}

/// Layer the environment and then the command line over `config`, and validate.
pub fn resolve<F>(
    mut config: ServerConfig,
    cli: &CommandLine,
    lookup: F,
) -> Result<(ServerConfig, Vec<OverrideWarning>), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let warnings = apply_env_overrides(&mut config, lookup);
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok((config, warnings))
}

/// Overlay environment variables onto a configuration.
///
/// `lookup` abstracts the environment so overrides can be exercised without
/// touching process state. Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, lookup: F) -> Vec<OverrideWarning>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut warnings = Vec::new();

    if let Some(port) = lookup(ENV_PORT) {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                let mut addr = config
                    .listener
                    .bind_address
                    .parse::<SocketAddr>()
                    .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));
                addr.set_port(port);
                config.listener.bind_address = addr.to_string();
            }
            Err(_) => warnings.push(OverrideWarning::InvalidPort(port)),
        }
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = level.trim().to_lowercase();
    }

    if let Some(url) = lookup(ENV_API_PROXY_URL) {
        let path_prefix = match &config.upstream {
            UpstreamConfig::WithUpstream { path_prefix, .. } => path_prefix.clone(),
            UpstreamConfig::Standalone => DEFAULT_API_PREFIX.to_string(),
        };
        config.upstream = UpstreamConfig::WithUpstream {
            base_url: url.trim().to_string(),
            path_prefix,
        };
    }

    warnings
}
