use axum_server::Handle;
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
};

pub mod config;
pub mod datadog;
pub mod extract;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod relay;
pub mod webhook;

/// Time in-flight requests get to finish once shutdown starts
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Run a single log search for this query, print the summary and exit
    #[arg(short, long)]
    pub query: Option<String>,
}

/// Handle signals by gracefully shutting down the server behind `handle`
pub fn signal_handler(handle: Handle) {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::error!("Failed to install signal handlers: {}", e);
            return;
        }

        handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });
}

async fn wait_for_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    select! {
        _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
        _ = sigint.recv() => tracing::info!("SIGINT received, shutting down"),
    }

    Ok(())
}
