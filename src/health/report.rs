//! Health document.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// What is known about the upstream when the health document is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamHealth {
    /// No upstream is configured.
    Disabled,
    /// An upstream is configured but probing is switched off.
    NotProbed,
    Reachable,
    Unreachable,
}

/// Body of the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub upstream: UpstreamHealth,
}

impl HealthReport {
    pub fn new(upstream: UpstreamHealth) -> Self {
        Self {
            ok: upstream != UpstreamHealth::Unreachable,
            upstream,
        }
    }

    pub fn status(&self) -> StatusCode {
        if self.ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_ok_flag() {
        let json = serde_json::to_value(HealthReport::new(UpstreamHealth::NotProbed)).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "upstream": "not_probed"}));
    }

    #[test]
    fn test_unreachable_is_unhealthy() {
        let report = HealthReport::new(UpstreamHealth::Unreachable);
        assert!(!report.ok);
        assert_eq!(report.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
