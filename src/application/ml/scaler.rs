//! Robust (median / IQR) feature scaling fitted offline.

use crate::domain::errors::{PredictionError, StartupError};
use crate::domain::ml::feature_registry::FeatureSchema;
use ndarray::Array2;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// On-disk form of the fitted scaler.
#[derive(Debug, Clone, Deserialize)]
pub struct RobustScalerParams {
    #[serde(default, alias = "center_")]
    pub center: Option<Vec<f64>>,
    #[serde(default, alias = "scale_")]
    pub scale: Option<Vec<f64>>,
    #[serde(default, alias = "feature_names_in_")]
    pub feature_names: Option<Vec<String>>,
}

/// Per-column affine transform `(x - center) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct RobustScaler {
    center: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
    n_features: usize,
}

impl RobustScaler {
    pub fn new(center: Option<Vec<f64>>, scale: Option<Vec<f64>>) -> Result<Self, String> {
        let n_features = match (&center, &scale) {
            (Some(c), Some(s)) if c.len() != s.len() => {
                return Err(format!(
                    "center has {} entries but scale has {}",
                    c.len(),
                    s.len()
                ));
            }
            (Some(c), _) => c.len(),
            (None, Some(s)) => s.len(),
            (None, None) => return Err("scaler has neither center nor scale".to_string()),
        };

        if let Some(c) = &center {
            if c.iter().any(|v| !v.is_finite()) {
                return Err("center contains non-finite values".to_string());
            }
        }

        // Zero scales are replaced by one, as the fitting side does.
        let scale = match scale {
            Some(s) => {
                if s.iter().any(|v| !v.is_finite()) {
                    return Err("scale contains non-finite values".to_string());
                }
                Some(
                    s.into_iter()
                        .map(|v| if v == 0.0 { 1.0 } else { v })
                        .collect(),
                )
            }
            None => None,
        };

        Ok(Self {
            center,
            scale,
            n_features,
        })
    }

    /// Loads the scaler and checks it against the configured feature order.
    pub fn from_json_file(path: &Path, schema: &FeatureSchema) -> Result<Self, StartupError> {
        let invalid = |reason: String| StartupError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        };

        let raw = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let params: RobustScalerParams =
            serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;

        if let Some(names) = &params.feature_names {
            if !names.iter().map(String::as_str).eq(schema.names()) {
                return Err(invalid(
                    "feature order differs from the model configuration".to_string(),
                ));
            }
        }

        let scaler = Self::new(params.center, params.scale).map_err(invalid)?;
        if scaler.n_features != schema.len() {
            return Err(invalid(format!(
                "fitted on {} features, configuration lists {}",
                scaler.n_features,
                schema.len()
            )));
        }
        Ok(scaler)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn transform(&self, window: &Array2<f64>) -> Result<Array2<f64>, PredictionError> {
        if window.ncols() != self.n_features {
            return Err(PredictionError::inference(format!(
                "scaler expects {} features, window has {}",
                self.n_features,
                window.ncols()
            )));
        }

        let mut scaled = window.clone();
        for (j, mut column) in scaled.columns_mut().into_iter().enumerate() {
            let center = self.center.as_ref().map_or(0.0, |c| c[j]);
            let scale = self.scale.as_ref().map_or(1.0, |s| s[j]);
            column.mapv_inplace(|x| (x - center) / scale);
        }
        Ok(scaled)
    }
}
