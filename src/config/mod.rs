//! Configuration module for Signalcast.
//!
//! Structured configuration loaded from environment variables, organized by
//! concern: HTTP server, model artifacts and market data provider.

mod market_data_config;
mod model_config;
mod server_config;

pub use market_data_config::MarketDataEnvConfig;
pub use model_config::{MODEL_CONFIG_FILE, ModelEnvConfig, SCALER_FILE};
pub use server_config::ServerEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Reads `key` from the environment, falling back to `default` when unset.
/// A set but unparsable value is an error.
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub models: ModelEnvConfig,
    pub market_data: MarketDataEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerEnvConfig::from_env().context("Failed to load server config")?,
            models: ModelEnvConfig::from_env().context("Failed to load model config")?,
            market_data: MarketDataEnvConfig::from_env()
                .context("Failed to load market data config")?,
        })
    }
}
