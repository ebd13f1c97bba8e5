use crate::domain::errors::PredictionError;
use crate::domain::market::Candle;
use crate::domain::ports::CandleSource;
use async_trait::async_trait;
use tokio::sync::Mutex;

const HOUR_MS: i64 = 3_600_000;
const START_MS: i64 = 1_700_000_000_000;

/// In-memory candle source for tests and offline runs.
pub struct MockCandleSource {
    candles: Vec<Candle>,
    failure: Option<String>,
    requests: Mutex<Vec<(String, usize)>>,
}

impl MockCandleSource {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every fetch fails as an upstream error with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            candles: Vec::new(),
            failure: Some(reason.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `(symbol, limit)` of every fetch so far.
    pub async fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch_recent_candles(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, PredictionError> {
        self.requests.lock().await.push((symbol.to_string(), limit));

        if let Some(reason) = &self.failure {
            return Err(PredictionError::upstream(reason.clone()));
        }

        let skip = self.candles.len().saturating_sub(limit);
        Ok(self.candles[skip..].to_vec())
    }
}

/// Hourly candles following a deterministic oscillating drift around
/// `base_price`.
pub fn synthetic_candles(count: usize, base_price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = base_price * (1.0 + 0.02 * (t * 0.7).sin() + 0.001 * t);
            let open = base_price * (1.0 + 0.02 * ((t - 1.0) * 0.7).sin() + 0.001 * (t - 1.0));
            Candle {
                timestamp: START_MS + i as i64 * HOUR_MS,
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume: 1_000.0 + 150.0 * ((t * 0.3).cos() + 1.0),
            }
        })
        .collect()
}

/// Hourly candles with an unchanging price.
pub fn constant_candles(count: usize, price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| Candle {
            timestamp: START_MS + i as i64 * HOUR_MS,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1_000.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_most_recent_candles() {
        let source = MockCandleSource::new(synthetic_candles(10, 100.0));
        let candles = source.fetch_recent_candles("BTC/USDT", 4).await.unwrap();

        assert_eq!(candles.len(), 4);
        assert_eq!(candles[3].timestamp, START_MS + 9 * HOUR_MS);
        assert_eq!(
            source.requests().await,
            vec![("BTC/USDT".to_string(), 4)]
        );
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let source = MockCandleSource::failing("CoinDCX API Error: 500");
        let err = source.fetch_recent_candles("BTC/USDT", 4).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_synthetic_series_is_ascending_and_positive() {
        let candles = synthetic_candles(100, 50_000.0);
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(candles.iter().all(|c| c.low <= c.close && c.close <= c.high));
    }
}
