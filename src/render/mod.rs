//! Server-side rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Static miss for path P
//!     → fallback.rs (read <document_root>/index.html)
//!     → app.rs (RenderApp::render(P) on the blocking pool)
//!     → fallback.rs (fill <div id="root"></div>)
//!     → 200 text/html
//! ```

pub mod app;
pub mod fallback;

pub use app::{AppError, FragmentApp, RenderApp};
pub use fallback::{PageRenderFallback, RenderError};
