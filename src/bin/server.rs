//! Signalcast Server - real-time direction predictions over HTTP
//!
//! Loads the feature list, scaler and per-horizon model pairs once, then
//! serves `GET /`, `GET /health` and `POST /predict`.
//!
//! # Usage
//! ```sh
//! MODEL_DIR=hybrid_models cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `MODEL_DIR` - Directory holding model_config.json, scaler.json and model files
//! - `WINDOW_SIZE` - Time steps per model window (default: 48)
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listen address (default: 0.0.0.0:7860)
//! - `MARKET_DATA_URL` - CoinDCX candle endpoint

use anyhow::{Context, Result};
use clap::Parser;
use signalcast::application::PredictionService;
use signalcast::application::ml::ModelRegistry;
use signalcast::config::Config;
use signalcast::infrastructure::CoinDcxMarketDataService;
use signalcast::interfaces::http;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Real-time direction prediction server", long_about = None)]
struct Cli {
    /// Model artifact directory (overrides MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Listen port (overrides SERVER_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Signalcast Server {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.model_dir {
        config.models.model_dir = dir;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Artifacts must be in place before accepting traffic
    let registry = ModelRegistry::load(&config.models).context("Failed to load model artifacts")?;
    let horizons: Vec<String> = registry.horizons().map(|h| h.to_string()).collect();
    info!(
        "Models ready: {} horizons [{}], window {}, {} features",
        registry.models_loaded(),
        horizons.join(", "),
        registry.window_size(),
        registry.schema().len()
    );
    if horizons.is_empty() {
        warn!("No horizon models loaded; every prediction will be rejected");
    }

    let market_data = CoinDcxMarketDataService::from_config(&config.market_data)?;
    let service = Arc::new(PredictionService::new(
        Arc::new(registry),
        Arc::new(market_data),
        config.market_data.extra_candles,
    ));

    let addr = config.server.socket_addr()?;
    http::serve(service, addr, async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received. Exiting...");
    })
    .await?;

    Ok(())
}
