//! vintagedb server binary
//!
//! Seeds the in-memory store and serves the provider contract over HTTP.

use vintagedb::api;
use vintagedb::config::ComponentFactory;
use vintagedb::telemetry::Telemetry;

use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// vintagedb time-series provider
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "VINTAGEDB_HTTP_PORT")]
    http_port: Option<u16>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("vintagedbd", &args.log_level)?;

    info!("Starting vintagedb provider");

    let store = ComponentFactory::create_store()?;
    let api_config = ComponentFactory::resolve_api_config(args.http_port)?;
    let router = api::build_http_router(&api_config, store);

    let addr = SocketAddr::from(([0, 0, 0, 0], api_config.http_port));
    let listener = TcpListener::bind(addr).await?;

    info!(http_port = api_config.http_port, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}
