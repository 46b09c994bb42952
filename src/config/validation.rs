//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that path prefixes are origin-form and do not shadow each other
//! - Validate the upstream URL and timeout ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ServerConfig, UpstreamConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("site.document_root must not be empty")]
    EmptyDocumentRoot,

    #[error("{field} {value:?} must start with '/'")]
    RelativePrefix { field: &'static str, value: String },

    #[error("health prefix {health:?} overlaps API prefix {api:?}")]
    OverlappingPrefixes { health: String, api: String },

    #[error("upstream.base_url {url:?} is invalid: {reason}")]
    UpstreamUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("render.template must not be empty")]
    EmptyTemplate,
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.site.document_root.trim().is_empty() {
        errors.push(ValidationError::EmptyDocumentRoot);
    }

    if config.render.template.trim().is_empty() {
        errors.push(ValidationError::EmptyTemplate);
    }

    let health = &config.health.path_prefix;
    if !health.starts_with('/') {
        errors.push(ValidationError::RelativePrefix {
            field: "health.path_prefix",
            value: health.clone(),
        });
    }

    if let UpstreamConfig::WithUpstream { base_url, path_prefix } = &config.upstream {
        if !path_prefix.starts_with('/') {
            errors.push(ValidationError::RelativePrefix {
                field: "upstream.path_prefix",
                value: path_prefix.clone(),
            });
        } else if health.starts_with(path_prefix.as_str()) || path_prefix.starts_with(health.as_str()) {
            errors.push(ValidationError::OverlappingPrefixes {
                health: health.clone(),
                api: path_prefix.clone(),
            });
        }

        if let Err(reason) = check_upstream_url(base_url) {
            errors.push(ValidationError::UpstreamUrl {
                url: base_url.clone(),
                reason,
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.forward_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.forward_secs"));
    }
    if config.health.probe_upstream && config.health.probe_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("health.probe_timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
