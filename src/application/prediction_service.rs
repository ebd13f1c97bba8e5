//! Per-request orchestration: horizon resolution, candle fetch, feature
//! window, staged inference and thresholding.

use crate::application::ml::ModelRegistry;
use crate::domain::errors::PredictionError;
use crate::domain::ml::horizon::Horizon;
use crate::domain::ml::prediction::{Prediction, PredictionResult};
use crate::domain::ports::CandleSource;
use std::sync::Arc;
use tracing::{debug, info};

pub struct PredictionService {
    registry: Arc<ModelRegistry>,
    candles: Arc<dyn CandleSource>,
    extra_candles: usize,
}

impl PredictionService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        candles: Arc<dyn CandleSource>,
        extra_candles: usize,
    ) -> Self {
        Self {
            registry,
            candles,
            extra_candles,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Candles requested per prediction: the window plus indicator warm-up.
    pub fn fetch_limit(&self) -> usize {
        self.registry.window_size() + self.extra_candles
    }

    pub async fn predict(
        &self,
        symbol: &str,
        minutes: i64,
    ) -> Result<PredictionResult, PredictionError> {
        let horizon = Horizon::resolve(minutes);
        let pair = self
            .registry
            .pair(horizon)
            .ok_or(PredictionError::UnsupportedHorizon {
                hours: horizon.hours(),
            })?;

        let candles = self
            .candles
            .fetch_recent_candles(symbol, self.fetch_limit())
            .await?;
        debug!(
            "Fetched {} candles for {}, newest opened {:?}",
            candles.len(),
            symbol,
            candles.last().and_then(|c| c.open_time())
        );

        let current_price = candles
            .last()
            .map(|c| c.close)
            .ok_or(PredictionError::InsufficientData {
                required: self.registry.window_size(),
                available: 0,
            })?;

        let window = self.registry.prepare_window(&candles)?;
        let probability_up = pair.probability_up(&window)?;
        let prediction = Prediction::from_probability(probability_up)?;

        info!(
            "Prediction {} {}: {} (p_up={:.4}, price={})",
            symbol,
            horizon,
            prediction.direction.as_str(),
            probability_up,
            current_price
        );

        Ok(PredictionResult {
            symbol: symbol.to_string(),
            requested_minutes: minutes,
            horizon,
            model_used: pair.label(),
            prediction,
            current_price,
        })
    }
}
