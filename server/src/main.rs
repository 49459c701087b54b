//! `docshelf-server` entry point.
//!
//! Stdio tool server bridging local callers to a remote managed document
//! index. Configuration comes from `DOCSHELF_*` environment variables with
//! CLI flags taking precedence.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docshelf_core::Config;
use docshelf_core::Ops;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "docshelf-server", version, about = "Stdio document-index tool server")]
struct Cli {
    /// Index service base URL; overrides DOCSHELF_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Collection display name; overrides DOCSHELF_COLLECTION.
    #[arg(long)]
    collection: Option<String>,

    /// Per-request timeout in seconds; overrides DOCSHELF_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the protocol stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(collection) = cli.collection {
        config.collection = Some(collection);
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = std::time::Duration::from_secs(secs);
    }
    if config.api_key.is_none() {
        tracing::warn!("DOCSHELF_API_KEY is not set; index requests will be rejected");
    }

    let ops = Arc::new(Ops::new(config).context("failed to initialize the index client")?);

    tracing::info!("docshelf-server v{} on stdio", env!("CARGO_PKG_VERSION"));
    tokio::select! {
        result = docshelf_server::serve(ops) => {
            result.context("stdio loop failed")?;
            tracing::info!("stdin closed, exiting");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, exiting");
        }
    }
    Ok(())
}
