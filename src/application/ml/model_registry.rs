//! Process-wide, read-only model state: the shared feature schema, scaler and
//! window size, plus one encoder/classifier pair per available horizon.

use super::onnx_encoder::OnnxSequenceEncoder;
use super::scaler::RobustScaler;
use super::xgboost::XgbClassifier;
use crate::application::features::{FeatureAssembler, compute_features};
use crate::config::ModelEnvConfig;
use crate::domain::errors::{ModelLoadError, PredictionError, StartupError};
use crate::domain::market::Candle;
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::horizon::{Horizon, PREDICTION_HORIZONS};
use crate::domain::ports::{DirectionClassifier, SequenceEncoder};
use ndarray::{Array3, Axis};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use tracing::{info, warn};

/// `model_config.json`
#[derive(Debug, Deserialize)]
struct ModelConfigFile {
    features: Vec<String>,
    #[serde(default)]
    window_size: Option<usize>,
}

/// Encoder and the classifier trained on its output. The two are only valid
/// together.
pub struct ModelPair {
    horizon: Horizon,
    encoder: Box<dyn SequenceEncoder>,
    classifier: Box<dyn DirectionClassifier>,
}

impl ModelPair {
    pub fn new(
        horizon: Horizon,
        encoder: Box<dyn SequenceEncoder>,
        classifier: Box<dyn DirectionClassifier>,
    ) -> Self {
        Self {
            horizon,
            encoder,
            classifier,
        }
    }

    fn load(config: &ModelEnvConfig, horizon: Horizon) -> Result<Self, ModelLoadError> {
        let encoder = OnnxSequenceEncoder::load(&config.encoder_path(horizon))?;
        let classifier = XgbClassifier::from_file(&config.classifier_path(horizon))?;
        Ok(Self::new(horizon, Box::new(encoder), Box::new(classifier)))
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// e.g. "LSTM+XGBoost 3h"
    pub fn label(&self) -> String {
        format!(
            "{}+{} {}",
            self.encoder.name(),
            self.classifier.name(),
            self.horizon
        )
    }

    pub fn probability_up(&self, window: &Array3<f32>) -> Result<f64, PredictionError> {
        let encoded = self.encoder.encode(window)?;
        self.classifier.probability_up(&encoded)
    }
}

pub struct ModelRegistry {
    assembler: FeatureAssembler,
    scaler: RobustScaler,
    pairs: BTreeMap<Horizon, ModelPair>,
}

impl ModelRegistry {
    pub fn new(
        schema: FeatureSchema,
        scaler: RobustScaler,
        window_size: usize,
        pairs: Vec<ModelPair>,
    ) -> Result<Self, StartupError> {
        if schema.is_empty() {
            return Err(StartupError::Inconsistent {
                reason: "feature list is empty".to_string(),
            });
        }
        if window_size == 0 {
            return Err(StartupError::Inconsistent {
                reason: "window size must be at least 1".to_string(),
            });
        }
        if scaler.n_features() != schema.len() {
            return Err(StartupError::Inconsistent {
                reason: format!(
                    "scaler has {} features, feature list has {}",
                    scaler.n_features(),
                    schema.len()
                ),
            });
        }

        Ok(Self {
            assembler: FeatureAssembler::new(schema, window_size),
            scaler,
            pairs: pairs.into_iter().map(|p| (p.horizon, p)).collect(),
        })
    }

    /// Loads every artifact under the model directory. The configuration and
    /// scaler are mandatory; a horizon whose models fail to load is skipped
    /// with a warning.
    pub fn load(config: &ModelEnvConfig) -> Result<Self, StartupError> {
        info!("Loading models from: {:?}", config.model_dir);

        let config_path = config.config_path();
        let raw = fs::read_to_string(&config_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StartupError::ConfigMissing {
                path: config_path.clone(),
            },
            _ => StartupError::InvalidArtifact {
                path: config_path.clone(),
                reason: e.to_string(),
            },
        })?;
        let model_config: ModelConfigFile =
            serde_json::from_str(&raw).map_err(|e| StartupError::InvalidArtifact {
                path: config_path.clone(),
                reason: e.to_string(),
            })?;

        let schema = FeatureSchema::new(model_config.features);
        info!("Features loaded: {}", schema.len());
        for name in schema.unresolved() {
            warn!("Feature '{}' is not computed and will be zero-filled", name);
        }

        let window_size = match model_config.window_size {
            Some(trained) if trained != config.window_size => {
                info!(
                    "Using window size {} from model configuration (configured {})",
                    trained, config.window_size
                );
                trained
            }
            Some(trained) => trained,
            None => config.window_size,
        };

        let scaler = RobustScaler::from_json_file(&config.scaler_path(), &schema)?;
        info!("Scaler loaded");

        let mut pairs = Vec::new();
        for horizon in PREDICTION_HORIZONS {
            match ModelPair::load(config, horizon) {
                Ok(pair) => {
                    info!("Loaded {} models", horizon);
                    pairs.push(pair);
                }
                Err(e) => warn!("Warning loading {}: {}", horizon, e),
            }
        }
        info!(
            "{} of {} horizon models loaded",
            pairs.len(),
            PREDICTION_HORIZONS.len()
        );

        Self::new(schema, scaler, window_size, pairs)
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.assembler.schema()
    }

    pub fn window_size(&self) -> usize {
        self.assembler.window_size()
    }

    pub fn models_loaded(&self) -> usize {
        self.pairs.len()
    }

    pub fn horizons(&self) -> impl Iterator<Item = Horizon> + '_ {
        self.pairs.keys().copied()
    }

    pub fn pair(&self, horizon: Horizon) -> Option<&ModelPair> {
        self.pairs.get(&horizon)
    }

    /// Candles to scaled `[1, W, F]` model input.
    pub fn prepare_window(&self, candles: &[Candle]) -> Result<Array3<f32>, PredictionError> {
        let table = compute_features(candles);
        let window = self.assembler.assemble(table)?;
        let scaled = self.scaler.transform(&window)?;
        Ok(scaled.mapv(|x| x as f32).insert_axis(Axis(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct ConstEncoder;

    impl SequenceEncoder for ConstEncoder {
        fn encode(&self, window: &Array3<f32>) -> Result<Vec<f32>, PredictionError> {
            Ok(vec![window.len() as f32])
        }

        fn name(&self) -> &str {
            "Const"
        }
    }

    struct FixedClassifier(f64);

    impl DirectionClassifier for FixedClassifier {
        fn probability_up(&self, _features: &[f32]) -> Result<f64, PredictionError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "Fixed"
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn identity_scaler(n: usize) -> RobustScaler {
        RobustScaler::new(Some(vec![0.0; n]), Some(vec![1.0; n])).unwrap()
    }

    #[test]
    fn test_pair_label_and_probability() {
        let pair = ModelPair::new(
            Horizon::from_hours(3),
            Box::new(ConstEncoder),
            Box::new(FixedClassifier(0.7)),
        );
        assert_eq!(pair.label(), "Const+Fixed 3h");
        let window = Array3::<f32>::zeros((1, 2, 2));
        assert_eq!(pair.probability_up(&window).unwrap(), 0.7);
    }

    #[test]
    fn test_new_rejects_scaler_width_mismatch() {
        let result = ModelRegistry::new(
            FeatureSchema::new(["Close", "Open"]),
            identity_scaler(3),
            48,
            Vec::new(),
        );
        assert!(matches!(result, Err(StartupError::Inconsistent { .. })));
    }

    #[test]
    fn test_registry_indexes_pairs_by_horizon() {
        let pairs = vec![
            ModelPair::new(
                Horizon::from_hours(6),
                Box::new(ConstEncoder),
                Box::new(FixedClassifier(0.2)),
            ),
            ModelPair::new(
                Horizon::from_hours(1),
                Box::new(ConstEncoder),
                Box::new(FixedClassifier(0.9)),
            ),
        ];
        let registry =
            ModelRegistry::new(FeatureSchema::new(["Close"]), identity_scaler(1), 4, pairs)
                .unwrap();

        assert_eq!(registry.models_loaded(), 2);
        assert_eq!(
            registry.horizons().collect::<Vec<_>>(),
            vec![Horizon::from_hours(1), Horizon::from_hours(6)]
        );
        assert!(registry.pair(Horizon::from_hours(3)).is_none());
    }

    #[test]
    fn test_load_without_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelEnvConfig::default().with_model_dir(dir.path());
        let result = ModelRegistry::load(&config);
        assert!(matches!(result, Err(StartupError::ConfigMissing { .. })));
    }

    #[test]
    fn test_load_without_scaler_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "model_config.json", r#"{"features": ["Close"]}"#);
        let config = ModelEnvConfig::default().with_model_dir(dir.path());
        let result = ModelRegistry::load(&config);
        assert!(matches!(result, Err(StartupError::InvalidArtifact { .. })));
    }

    #[test]
    fn test_load_with_missing_horizon_models_still_starts() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "model_config.json",
            r#"{"features": ["Close", "RSI_14", "unknown"], "window_size": 24}"#,
        );
        write(
            dir.path(),
            "scaler.json",
            r#"{"center": [100.0, 50.0, 0.0], "scale": [10.0, 20.0, 1.0]}"#,
        );
        // Classifier without its encoder is not a usable pair
        write(dir.path(), "xgboost_1h.json", "{}");

        let config = ModelEnvConfig::default().with_model_dir(dir.path());
        let registry = ModelRegistry::load(&config).unwrap();

        assert_eq!(registry.models_loaded(), 0);
        assert_eq!(registry.window_size(), 24);
        assert_eq!(registry.schema().len(), 3);
    }

    #[test]
    fn test_malformed_config_is_invalid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "model_config.json", r#"{"feature": []}"#);
        let config = ModelEnvConfig::default().with_model_dir(dir.path());
        let result = ModelRegistry::load(&config);
        assert!(matches!(result, Err(StartupError::InvalidArtifact { .. })));
    }
}
