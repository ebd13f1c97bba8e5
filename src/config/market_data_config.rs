//! Market data provider configuration parsing from environment variables.

use super::parse_env;
use anyhow::Result;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MarketDataEnvConfig {
    pub base_url: String,
    pub interval: String,
    pub timeout_secs: u64,
    /// Candles fetched beyond the window size, to cover indicator warm-up.
    pub extra_candles: usize,
}

impl Default for MarketDataEnvConfig {
    fn default() -> Self {
        Self {
            base_url: "https://public.coindcx.com/market_data/candles".to_string(),
            interval: "1h".to_string(),
            timeout_secs: 10,
            extra_candles: 50,
        }
    }
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            base_url: env::var("MARKET_DATA_URL").unwrap_or(defaults.base_url),
            interval: env::var("MARKET_DATA_INTERVAL").unwrap_or(defaults.interval),
            timeout_secs: parse_env("MARKET_DATA_TIMEOUT_SECS", defaults.timeout_secs)?,
            extra_candles: parse_env("MARKET_DATA_EXTRA_CANDLES", defaults.extra_candles)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_defaults() {
        let config = MarketDataEnvConfig::default();
        assert_eq!(config.interval, "1h");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.extra_candles, 50);
    }
}
