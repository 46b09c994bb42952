//! Server-side render fallback.
//!
//! # Responsibilities
//! - Read the HTML template from the document root
//! - Render the application for the request path off the async workers
//! - Substitute the markup into the template's empty root element
//!
//! # Design Decisions
//! - The template is read per request so a redeployed bundle is picked up
//! - A template without the root element is returned unchanged
//! - Only the first root element is filled

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::dispatch::classify::StatusCarrier;
use crate::render::app::{AppError, RenderApp};

/// Failure to produce a rendered document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not read template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    App(#[from] AppError),

    #[error("rendering {path} panicked: {reason}")]
    Panicked { path: String, reason: String },
}

impl StatusCarrier for RenderError {
    fn status(&self) -> Option<StatusCode> {
        Some(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Renders full HTML documents from the bundle template.
#[derive(Debug, Clone)]
pub struct PageRenderFallback {
    template: String,
    root_element_id: String,
}

impl Default for PageRenderFallback {
    fn default() -> Self {
        Self::new("index.html", "root")
    }
}

impl PageRenderFallback {
    pub fn new(template: impl Into<String>, root_element_id: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            root_element_id: root_element_id.into(),
        }
    }

    /// Produce the complete HTML document for `path`.
    pub async fn render<A: RenderApp>(
        &self,
        path: &str,
        document_root: &Path,
        app: &Arc<A>,
    ) -> Result<String, RenderError> {
        let template_path = document_root.join(&self.template);
        let template = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|source| RenderError::Template {
                path: template_path.clone(),
                source,
            })?;

        let app = Arc::clone(app);
        let location = path.to_string();
        let markup = tokio::task::spawn_blocking(move || app.render(&location))
            .await
            .map_err(|join_error| RenderError::Panicked {
                path: path.to_string(),
                reason: join_error.to_string(),
            })??;

        Ok(self.substitute(&template, &markup))
    }

    fn substitute(&self, template: &str, markup: &str) -> String {
        let empty = root_tag(&self.root_element_id, "");
        if !template.contains(&empty) {
            tracing::debug!(
                root = %self.root_element_id,
                "Template has no empty root element, serving it unchanged"
            );
            return template.to_string();
        }
        template.replacen(&empty, &root_tag(&self.root_element_id, markup), 1)
    }
}

fn root_tag(id: &str, content: &str) -> String {
    format!("<div id=\"{}\">{}</div>", id, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::app::FragmentApp;
    use std::fs;

    struct Failing;

    impl RenderApp for Failing {
        fn render(&self, path: &str) -> Result<String, AppError> {
            Err(AppError {
                path: path.to_string(),
                reason: "boom".into(),
            })
        }
    }

    struct Panicking;

    impl RenderApp for Panicking {
        fn render(&self, _path: &str) -> Result<String, AppError> {
            panic!("component exploded")
        }
    }

    fn root_with_template(html: &str) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), html).unwrap();
        root
    }

    #[tokio::test]
    async fn test_substitutes_markup_into_root() {
        let root = root_with_template(
            "<html><body><div id=\"root\"></div><div id=\"root\"></div></body></html>",
        );
        let app = Arc::new(FragmentApp::new("<p>{{path}}</p>"));

        let html = PageRenderFallback::default()
            .render("/dashboard", root.path(), &app)
            .await
            .unwrap();

        assert_eq!(
            html,
            "<html><body><div id=\"root\"><p>/dashboard</p></div><div id=\"root\"></div></body></html>"
        );
    }

    #[tokio::test]
    async fn test_custom_template_and_root_id() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("shell.html"), "<div id=\"app\"></div>").unwrap();
        let app = Arc::new(FragmentApp::new("ok"));

        let html = PageRenderFallback::new("shell.html", "app")
            .render("/", root.path(), &app)
            .await
            .unwrap();
        assert_eq!(html, "<div id=\"app\">ok</div>");
    }

    #[tokio::test]
    async fn test_template_without_root_is_unchanged() {
        let root = root_with_template("<html><body></body></html>");
        let app = Arc::new(FragmentApp::new("<p>x</p>"));

        let html = PageRenderFallback::default()
            .render("/x", root.path(), &app)
            .await
            .unwrap();
        assert_eq!(html, "<html><body></body></html>");
    }

    #[tokio::test]
    async fn test_missing_template() {
        let root = tempfile::tempdir().unwrap();
        let app = Arc::new(FragmentApp::default());

        let err = PageRenderFallback::default()
            .render("/x", root.path(), &app)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
    }

    #[tokio::test]
    async fn test_app_error_and_panic() {
        let root = root_with_template("<div id=\"root\"></div>");
        let fallback = PageRenderFallback::default();

        let err = fallback
            .render("/x", root.path(), &Arc::new(Failing))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::App(_)));

        let err = fallback
            .render("/x", root.path(), &Arc::new(Panicking))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Panicked { .. }));
    }
}
