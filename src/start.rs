//! Startup helpers for the instruct web server.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::server::{self, AppState};

/// Run the server until Ctrl+C.
///
/// Loads the model once before serving; a load failure ends the process.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting instruct-web v{}", env!("CARGO_PKG_VERSION"));

    match try_run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Install the global `tracing` subscriber, INFO by default.
pub fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()
    {
        tracing::debug!("Keeping the existing tracing subscriber: {e}");
    }
}

fn try_run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        "Model directory: {} (max_new_tokens={})",
        config.model_dir.display(),
        config.generation.max_new_tokens
    );

    let state = initialize(&config)?;

    let rt = tokio::runtime::Runtime::new().context("failed to create runtime")?;
    rt.block_on(server::run_server_with_shutdown(
        state,
        config.port,
        shutdown_signal(),
    ))
    .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Load the model and build the shared state without starting the server.
///
/// # Errors
/// Returns an error if the model cannot be loaded or the page fails to compile.
pub fn initialize(config: &AppConfig) -> anyhow::Result<Arc<AppState>> {
    let generator = AppState::load_generator(config)
        .inspect_err(|e| {
            if e.is_load_error() {
                tracing::error!(
                    "{} must contain config.json, tokenizer.json and safetensors weights",
                    config.model_dir.display()
                );
            }
        })
        .with_context(|| format!("failed to load model from {}", config.model_dir.display()))?;

    AppState::new(generator).context("failed to compile page template")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl+C handler unavailable: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
