use crate::domain::errors::PredictionError;
use crate::domain::market::Candle;
use async_trait::async_trait;
use ndarray::Array3;

/// Source of recent candles for a symbol.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Returns up to `limit` of the most recent candles, oldest first.
    async fn fetch_recent_candles(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, PredictionError>;
}

/// Sequence model turning a scaled `[1, W, F]` window into a flat feature
/// vector for its paired classifier.
pub trait SequenceEncoder: Send + Sync {
    fn encode(&self, window: &Array3<f32>) -> Result<Vec<f32>, PredictionError>;

    fn name(&self) -> &str;
}

/// Classifier trained on the output of one specific encoder.
pub trait DirectionClassifier: Send + Sync {
    /// Probability that price is up at the horizon, in [0, 1].
    fn probability_up(&self, features: &[f32]) -> Result<f64, PredictionError>;

    fn name(&self) -> &str;
}
