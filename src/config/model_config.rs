//! Model artifact configuration: where the shared feature list, scaler and
//! per-horizon model files live.

use super::parse_env;
use crate::domain::ml::horizon::Horizon;
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

pub const MODEL_CONFIG_FILE: &str = "model_config.json";
pub const SCALER_FILE: &str = "scaler.json";

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub model_dir: PathBuf,
    pub window_size: usize,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("hybrid_models"),
            window_size: 48,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let window_size = parse_env("WINDOW_SIZE", defaults.window_size)?;
        if window_size == 0 {
            anyhow::bail!("WINDOW_SIZE must be at least 1");
        }

        Ok(Self {
            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            window_size,
        })
    }

    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.model_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_CONFIG_FILE)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(SCALER_FILE)
    }

    /// `lstm_{h}h.onnx`
    pub fn encoder_path(&self, horizon: Horizon) -> PathBuf {
        self.model_dir.join(format!("lstm_{}.onnx", horizon))
    }

    /// `xgboost_{h}h.json`
    pub fn classifier_path(&self, horizon: Horizon) -> PathBuf {
        self.model_dir.join(format!("xgboost_{}.json", horizon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        let config = ModelEnvConfig::default().with_model_dir("/models");
        let h = Horizon::from_hours(6);
        assert_eq!(config.config_path(), PathBuf::from("/models/model_config.json"));
        assert_eq!(config.scaler_path(), PathBuf::from("/models/scaler.json"));
        assert_eq!(config.encoder_path(h), PathBuf::from("/models/lstm_6h.onnx"));
        assert_eq!(
            config.classifier_path(h),
            PathBuf::from("/models/xgboost_6h.json")
        );
    }
}
