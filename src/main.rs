//! dirscribe - live directory tree documents
//!
//! Entry point for the dirscribe binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;

use clap::Parser;
use dirscribe::observability::config_from_env;
use dirscribe::{Config, Generator, Refresh, Result, RootContext};
use tokio::signal;

/// dirscribe - keep a Markdown rendering of a project tree up to date
#[derive(Parser, Debug)]
#[command(name = "dirscribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to start project root detection from
    #[arg(short, long, env = "DIRSCRIBE_ROOT", default_value = ".")]
    root: PathBuf,

    /// YAML configuration file
    #[arg(short, long, env = "DIRSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Write the document once and exit
    #[arg(long)]
    once: bool,

    /// Quiet period after the last change before rebuilding, in milliseconds
    #[arg(long, env = "DIRSCRIBE_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    /// Render bare names without category glyphs
    #[arg(long, env = "DIRSCRIBE_NO_EMOJIS")]
    no_emojis: bool,

    /// Log level (trace, debug, info, warn, error) [env: DIRSCRIBE_LOG_LEVEL]
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging output [env: DIRSCRIBE_LOG_JSON]
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if self.no_emojis {
            config.use_emojis = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let tracing_config = config_from_env().with_overrides(cli.log_level.clone(), cli.log_json);
    tracing_config.init();

    tracing::info!("dirscribe v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    tracing::debug!(?config, "Configuration loaded");

    let root = RootContext::detect(&cli.root)?;
    tracing::info!(root = %root.root().display(), "Project root");

    let mut generator = Generator::new(&root, config)?;

    if cli.once {
        match generator.refresh()? {
            Refresh::Written(document) => tracing::info!(
                path = %generator.output_path().display(),
                entries = document.entry_lines().len(),
                "Document written"
            ),
            Refresh::Unchanged => {}
        }
        return Ok(());
    }

    let handle = generator.watch(|_| {})?;

    let token = handle.cancellation_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });

    let stats = handle.join().await?;
    tracing::info!(
        rebuilds = stats.rebuilds,
        written = stats.documents_written,
        errors = stats.errors,
        "Shut down gracefully"
    );
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
