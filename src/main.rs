//! render-edge: HTTP edge server for a server-rendered web application.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ dispatch engine
//!                                       ├─ health check   (/healthz)
//!                                       ├─ API proxy      (/api → upstream)
//!                                       ├─ static file    (document root)
//!                                       └─ render on miss (index.html + app)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use render_edge::config::{loader, ServerConfig};
use render_edge::lifecycle::{self, Shutdown};
use render_edge::observability::logging;
use render_edge::FragmentApp;

#[derive(Parser)]
#[command(name = "render-edge")]
#[command(about = "Serve a web application bundle with server-side rendering", long_about = None)]
struct Cli {
    /// Directory holding the static bundle and its index.html
    app_dir: PathBuf,

    /// HTML fragment rendered into the page root; `{{path}}` is replaced by the request path
    app_fragment: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    bind: Option<String>,
}

fn load(cli: &Cli) -> Result<(ServerConfig, Vec<loader::OverrideWarning>), loader::ConfigError> {
    let config = match &cli.config {
        Some(path) => loader::read_config(path)?,
        None => ServerConfig::default(),
    };

    let overrides = loader::CommandLine {
        document_root: Some(cli.app_dir.to_string_lossy().into_owned()),
        bind_address: cli.bind.clone(),
    };
    loader::resolve(config, &overrides, |key| std::env::var(key).ok())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, warnings) = match load(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("render-edge: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("render-edge: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("render-edge v{} starting", env!("CARGO_PKG_VERSION"));
    for warning in &warnings {
        tracing::warn!(%warning, "Environment override skipped");
    }

    let app = match &cli.app_fragment {
        Some(path) => match FragmentApp::from_file(path) {
            Ok(app) => app,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to load application fragment");
                return ExitCode::FAILURE;
            }
        },
        None => FragmentApp::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        document_root = %config.site.document_root,
        forward_timeout_secs = config.timeouts.forward_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    lifecycle::spawn_signal_handler(shutdown.clone());

    match lifecycle::run(&config, app, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
