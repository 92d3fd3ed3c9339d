//! Proxy server binary.
//!
//! Loads configuration, builds the credential vault once and serves the
//! aggregation and local-search endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geogate::config::Config;
use geogate::gateway::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "geogate")]
#[command(about = "Geospatial data-aggregation proxy")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// TOML configuration file (upstream hosts and credentials)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Geogate proxy");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load_from_file(path)?
        }
        None => {
            warn!("No configuration file given, using built-in upstream defaults");
            Config::default()
        }
    };
    config.apply_env();

    let state = AppState::from_config(&config)?;

    let names = state.vault.names();
    if names.is_empty() {
        warn!("No 'open' sub-API credentials configured");
    } else {
        info!("Configured 'open' sub-APIs: {}", names.join(", "));
    }

    let app = router(Arc::new(state));

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
