//! Upstream target description and URI rewriting.

use std::str::FromStr;

use axum::http::uri::{Authority, Uri};
use url::Url;

use crate::proxy::forwarder::UpstreamError;
use crate::routing::matcher::PathPrefix;

/// Where proxied requests go and which prefix is removed on the way.
#[derive(Debug, Clone)]
pub struct Upstream {
    base_url: Url,
    authority: Authority,
    prefix: PathPrefix,
}

impl Upstream {
    /// Parse an upstream base URL and pair it with the API prefix it serves.
    pub fn new(base_url: &str, prefix: impl Into<String>) -> Result<Self, UpstreamError> {
        let invalid = |reason: String| UpstreamError::InvalidTarget {
            target: base_url.to_string(),
            reason,
        };

        let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            base_url: url,
            authority,
            prefix: PathPrefix::new(prefix),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `host[:port]` of the upstream, used for the forwarded `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn prefix(&self) -> &PathPrefix {
        &self.prefix
    }

    /// Absolute upstream URI for an inbound path-and-query.
    ///
    /// The configured prefix is removed when present; anything else is
    /// forwarded unchanged. The base URL's own path is kept in front and the
    /// query string is preserved.
    pub fn target_uri(&self, path_and_query: &str) -> Result<Uri, UpstreamError> {
        let stripped = self.prefix.strip(path_and_query);
        let base_path = self.base_url.path().trim_end_matches('/');

        let tail = if stripped.is_empty() || stripped.starts_with('?') {
            format!("/{}", stripped)
        } else if stripped.starts_with('/') {
            stripped.to_string()
        } else {
            format!("/{}", stripped)
        };

        let target = format!("{}://{}{}{}", self.base_url.scheme(), self.authority, base_path, tail);
        Uri::from_str(&target).map_err(|e| UpstreamError::InvalidTarget {
            target,
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_url)
    }
}
