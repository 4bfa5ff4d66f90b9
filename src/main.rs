use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};

use iam_reference_mcp::{
    cli::config_path_from_args,
    config::Config,
    logging::init_tracing,
    reference::{HttpReferenceSource, ReferenceCatalog},
    server::{McpServer, serve},
    tools::Toolbox,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match config_path_from_args()? {
        Some(config_path) => Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?,
        None => Config::default(),
    };
    let logging_guard = init_tracing(&config.logging)?;

    let source = HttpReferenceSource::new(&config.reference)
        .context("failed to construct reference http client")?;
    let catalog = Arc::new(ReferenceCatalog::new(Arc::new(source)));
    let server = Arc::new(McpServer::new(Toolbox::new(catalog)));

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;

    tracing::info!(
        target: "server",
        run_id = logging_guard.run_id(),
        base_url = %config.reference.base_url,
        "serving_stdio"
    );

    let stop_reason = tokio::select! {
        result = serve(server, tokio::io::stdin(), tokio::io::stdout()) => {
            result?;
            "stdin closed"
        }
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };

    tracing::info!(target: "server", reason = stop_reason, "server_stopped");
    drop(logging_guard);
    Ok(())
}
