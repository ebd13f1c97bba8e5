#![allow(dead_code)]

use ndarray::Array3;
use signalcast::application::PredictionService;
use signalcast::application::ml::scaler::RobustScaler;
use signalcast::application::ml::{ModelPair, ModelRegistry};
use signalcast::domain::errors::PredictionError;
use signalcast::domain::ml::feature_registry::FeatureSchema;
use signalcast::domain::ml::horizon::Horizon;
use signalcast::domain::ports::{CandleSource, DirectionClassifier, SequenceEncoder};
use std::sync::Arc;

pub const WINDOW: usize = 10;
pub const EXTRA_CANDLES: usize = 50;
pub const FEATURES: [&str; 4] = ["Close", "RSI_14", "MACDh_12_26_9", "Volume_Ratio"];

/// Encoder that reports the mean of the newest time step.
pub struct LastStepMean;

impl SequenceEncoder for LastStepMean {
    fn encode(&self, window: &Array3<f32>) -> Result<Vec<f32>, PredictionError> {
        let (_, steps, features) = window.dim();
        let last = steps - 1;
        let sum: f32 = (0..features).map(|f| window[[0, last, f]]).sum();
        Ok(vec![sum / features as f32])
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}

pub struct FixedClassifier(pub f64);

impl DirectionClassifier for FixedClassifier {
    fn probability_up(&self, _features: &[f32]) -> Result<f64, PredictionError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "XGBoost"
    }
}

pub struct BrokenClassifier;

impl DirectionClassifier for BrokenClassifier {
    fn probability_up(&self, _features: &[f32]) -> Result<f64, PredictionError> {
        Err(PredictionError::inference("tree walk failed"))
    }

    fn name(&self) -> &str {
        "XGBoost"
    }
}

pub fn pair(hours: u32, classifier: Box<dyn DirectionClassifier>) -> ModelPair {
    ModelPair::new(Horizon::from_hours(hours), Box::new(LastStepMean), classifier)
}

/// Registry over the test feature list with an identity scaler.
pub fn registry(pairs: Vec<ModelPair>) -> ModelRegistry {
    let schema = FeatureSchema::new(FEATURES);
    let scaler = RobustScaler::new(
        Some(vec![0.0; FEATURES.len()]),
        Some(vec![1.0; FEATURES.len()]),
    )
    .unwrap();
    ModelRegistry::new(schema, scaler, WINDOW, pairs).unwrap()
}

pub fn service(pairs: Vec<ModelPair>, candles: Arc<dyn CandleSource>) -> PredictionService {
    PredictionService::new(Arc::new(registry(pairs)), candles, EXTRA_CANDLES)
}
