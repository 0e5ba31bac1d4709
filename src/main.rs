use alert_log_relay::{Args, config, http, logging, metrics, relay::Relay, signal_handler};
use axum_server::Handle;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse config
    let args = Args::parse();
    let config = config::Config::from_file(&args.config)?;

    // Setup tracing
    let _logging = logging::init(&config.logging)?;
    tracing::info!("Loaded config from {}", args.config.display());

    let relay = Relay::new(&config)?;

    // One-shot search
    if let Some(query) = args.query {
        let summary = relay.query(&query).await?;
        println!("{summary}");

        return Ok(());
    }

    // Register metrics
    metrics::register_metrics();

    // Handle signals
    let handle = Handle::new();
    signal_handler(handle.clone());

    // Start the HTTP server
    http::create_server(config, relay, handle).await
}
