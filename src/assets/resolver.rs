//! Static asset resolution over the document root.
//!
//! # Responsibilities
//! - Serve files from the document root (content type, validators, ranges)
//! - Report a missing file as `NotFound`, distinct from every other failure
//! - Attach the configured `Cache-Control` to served files
//!
//! # Design Decisions
//! - File serving is delegated to `tower_http::services::ServeDir`
//! - Error statuses produced by `ServeDir` are returned, never written,
//!   so the engine alone decides what the client sees

use std::future::Future;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::Response;
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::dispatch::classify::StatusCarrier;
use crate::http::response::{ResponseSink, SinkError};

/// Failure to serve a static asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No file matches the request path.
    #[error("no static asset for {path}")]
    NotFound { path: String },

    /// The file server answered with an error status (403, 405, 500, ...).
    #[error("static asset {path} failed with status {status}")]
    Status { path: String, status: StatusCode },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl AssetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound { .. })
    }
}

impl StatusCarrier for AssetError {
    fn status(&self) -> Option<StatusCode> {
        match self {
            AssetError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            AssetError::Status { status, .. } => Some(*status),
            AssetError::Sink(_) => None,
        }
    }
}

/// Serves static assets into a response sink.
pub trait AssetResolver: Send + Sync {
    /// Serve `request` from the document root.
    ///
    /// Resolves once the response is written to `sink`. Fails without
    /// writing when no file matches or the file cannot be served.
    fn serve<'a>(
        &'a self,
        request: Request<Body>,
        sink: &'a mut ResponseSink,
    ) -> impl Future<Output = Result<(), AssetError>> + Send + 'a;
}

/// `ServeDir` backed resolver.
#[derive(Debug, Clone)]
pub struct StaticAssetResolver {
    serve_dir: ServeDir,
    cache_control: Option<HeaderValue>,
}

impl StaticAssetResolver {
    pub fn new(document_root: impl AsRef<Path>) -> Self {
        Self {
            serve_dir: ServeDir::new(document_root.as_ref()).append_index_html_on_directories(true),
            cache_control: None,
        }
    }

    /// Attach `Cache-Control` to every successfully served file.
    pub fn with_cache_control(mut self, value: HeaderValue) -> Self {
        self.cache_control = Some(value);
        self
    }

    fn finish(&self, mut response: Response) -> Response {
        if let Some(value) = &self.cache_control {
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, value.clone());
        }
        response
    }
}

impl AssetResolver for StaticAssetResolver {
    fn serve<'a>(
        &'a self,
        request: Request<Body>,
        sink: &'a mut ResponseSink,
    ) -> impl Future<Output = Result<(), AssetError>> + Send + 'a {
        async move {
            let path = request.uri().path().to_string();
            let response = match self.serve_dir.clone().oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(AssetError::NotFound { path });
            }
            if status.is_client_error() || status.is_server_error() {
                return Err(AssetError::Status { path, status });
            }

            tracing::debug!(path = %path, status = status.as_u16(), "Serving static asset");
            sink.complete(self.finish(response.map(Body::new)))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("app.js"), "console.log('hi');").unwrap();
        let resolver = StaticAssetResolver::new(root.path())
            .with_cache_control(HeaderValue::from_static("public, max-age=60"));

        let mut sink = ResponseSink::new();
        resolver.serve(request("/app.js"), &mut sink).await.unwrap();

        let response = sink.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=60");
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"), "got {content_type}");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"console.log('hi');");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found_and_unwritten() {
        let root = tempfile::tempdir().unwrap();
        let resolver = StaticAssetResolver::new(root.path());

        let mut sink = ResponseSink::new();
        let err = resolver.serve(request("/dashboard"), &mut sink).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(sink.is_open());
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_not_a_miss() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("app.js"), "x").unwrap();
        let resolver = StaticAssetResolver::new(root.path());

        let request = Request::builder()
            .method("DELETE")
            .uri("/app.js")
            .body(Body::empty())
            .unwrap();
        let mut sink = ResponseSink::new();
        let err = resolver.serve(request, &mut sink).await.unwrap_err();

        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
        assert!(sink.is_open());
    }

    #[tokio::test]
    async fn test_directory_serves_index() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "<html></html>").unwrap();
        let resolver = StaticAssetResolver::new(root.path());

        let mut sink = ResponseSink::new();
        resolver.serve(request("/"), &mut sink).await.unwrap();
        assert_eq!(sink.status(), Some(StatusCode::OK));
    }
}
