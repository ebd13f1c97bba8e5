//! CoinDCX public candle endpoint.
//!
//! `GET {base_url}?pair=B-BTC_USDT&interval=1h&limit=N` returns a JSON array
//! of `{open, high, low, close, volume, time}` objects, newest first.

use crate::config::MarketDataEnvConfig;
use crate::domain::errors::PredictionError;
use crate::domain::market::Candle;
use crate::domain::market::candle::into_ascending;
use crate::domain::market::symbol::to_coindcx_pair;
use crate::domain::ports::CandleSource;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

/// Numeric field sent either as a JSON number or as a string.
fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct CoinDcxCandle {
    #[serde(deserialize_with = "number")]
    open: f64,
    #[serde(deserialize_with = "number")]
    high: f64,
    #[serde(deserialize_with = "number")]
    low: f64,
    #[serde(deserialize_with = "number")]
    close: f64,
    #[serde(deserialize_with = "number")]
    volume: f64,
    #[serde(deserialize_with = "number")]
    time: f64,
}

impl From<CoinDcxCandle> for Candle {
    fn from(raw: CoinDcxCandle) -> Self {
        Candle {
            timestamp: raw.time as i64,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        }
    }
}

pub struct CoinDcxMarketDataService {
    client: Client,
    base_url: String,
    interval: String,
}

impl CoinDcxMarketDataService {
    pub fn builder() -> CoinDcxMarketDataServiceBuilder {
        CoinDcxMarketDataServiceBuilder::default()
    }

    pub fn from_config(config: &MarketDataEnvConfig) -> Result<Self> {
        Self::builder()
            .base_url(config.base_url.clone())
            .interval(config.interval.clone())
            .timeout(config.timeout())
            .build()
    }
}

#[derive(Default)]
pub struct CoinDcxMarketDataServiceBuilder {
    base_url: Option<String>,
    interval: Option<String>,
    timeout: Option<Duration>,
}

impl CoinDcxMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn interval(mut self, interval: String) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<CoinDcxMarketDataService> {
        let defaults = MarketDataEnvConfig::default();
        let timeout = self.timeout.unwrap_or_else(|| defaults.timeout());
        let client = HttpClientFactory::create_client(timeout)
            .context("Failed to build CoinDCX HTTP client")?;

        Ok(CoinDcxMarketDataService {
            client,
            base_url: self.base_url.unwrap_or(defaults.base_url),
            interval: self.interval.unwrap_or(defaults.interval),
        })
    }
}

#[async_trait]
impl CandleSource for CoinDcxMarketDataService {
    async fn fetch_recent_candles(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, PredictionError> {
        let pair = to_coindcx_pair(symbol)?;
        let limit = limit.to_string();
        debug!(
            "CoinDCX: fetching {} {} candles for {}",
            limit, self.interval, pair
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("pair", pair.as_str()),
                ("interval", self.interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PredictionError::upstream(format!("CoinDCX request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::upstream(format!(
                "CoinDCX API Error: {}",
                status.as_u16()
            )));
        }

        let rows: Vec<CoinDcxCandle> = response.json().await.map_err(|e| {
            PredictionError::upstream(format!("Invalid CoinDCX candle payload: {}", e))
        })?;

        Ok(into_ascending(rows.into_iter().map(Candle::from).collect()))
    }
}
