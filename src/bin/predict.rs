//! One-shot prediction from the command line.
//!
//! Runs the same pipeline as `POST /predict` and prints the response body.

use anyhow::{Context, Result};
use clap::Parser;
use signalcast::application::PredictionService;
use signalcast::application::ml::ModelRegistry;
use signalcast::config::Config;
use signalcast::infrastructure::CoinDcxMarketDataService;
use signalcast::interfaces::http::{DEFAULT_MINUTES, PredictResponse};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about = "Predict price direction for one symbol", long_about = None)]
struct Cli {
    /// Symbol to predict
    #[arg(short, long, default_value = "BTC/USDT")]
    symbol: String,

    /// Lead time in minutes, mapped to the nearest trained horizon
    #[arg(short, long, default_value_t = DEFAULT_MINUTES)]
    minutes: i64,

    /// Model artifact directory (overrides MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.model_dir {
        config.models.model_dir = dir;
    }

    let registry = ModelRegistry::load(&config.models).context("Failed to load model artifacts")?;
    let market_data = CoinDcxMarketDataService::from_config(&config.market_data)?;
    let service = PredictionService::new(
        Arc::new(registry),
        Arc::new(market_data),
        config.market_data.extra_candles,
    );

    let result = service.predict(&cli.symbol, cli.minutes).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&PredictResponse::from(&result))?
    );
    Ok(())
}
