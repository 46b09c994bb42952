//! Application handles.
//!
//! The dispatch engine treats the application as opaque: the only thing it
//! can do with one is ask it for the markup of a path.

use std::fs;
use std::path::Path;

use askama::Template;
use thiserror::Error;

/// The application failed to produce markup.
#[derive(Debug, Error)]
#[error("application failed to render {path}: {reason}")]
pub struct AppError {
    pub path: String,
    pub reason: String,
}

/// Something that can be rendered to markup for a request path.
///
/// Rendering runs on the blocking thread pool, so implementations may be
/// CPU heavy but must be shareable across threads.
pub trait RenderApp: Send + Sync + 'static {
    fn render(&self, path: &str) -> Result<String, AppError>;
}

/// Placeholder replaced by the escaped request path in a [`FragmentApp`].
pub const PATH_PLACEHOLDER: &str = "{{path}}";

/// An application defined by a static HTML fragment.
///
/// Every occurrence of `{{path}}` in the fragment is replaced by the
/// HTML-escaped request path.
#[derive(Debug, Clone, Default)]
pub struct FragmentApp {
    fragment: String,
}

impl FragmentApp {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
        }
    }

    /// Load the fragment from a file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }
}

/// The request path, HTML-escaped on render.
#[derive(Template)]
#[template(source = "{{ path }}", ext = "html")]
struct EscapedPath<'a> {
    path: &'a str,
}

impl RenderApp for FragmentApp {
    fn render(&self, path: &str) -> Result<String, AppError> {
        let escaped = EscapedPath { path }.render().map_err(|e| AppError {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.fragment.replace(PATH_PLACEHOLDER, &escaped))
    }
}
