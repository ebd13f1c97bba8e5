use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of request failures, used by the HTTP boundary to
/// pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedHorizon,
    UpstreamFetch,
    InsufficientData,
    Inference,
    InvalidRequest,
}

/// Errors raised while serving a single prediction request
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Model for {hours}h not found")]
    UnsupportedHorizon { hours: u32 },

    #[error("Market data request failed: {reason}")]
    UpstreamFetch { reason: String },

    #[error("Need {required} candles, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Inference failed: {reason}")]
    Inference { reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::UnsupportedHorizon { .. } => ErrorKind::UnsupportedHorizon,
            PredictionError::UpstreamFetch { .. } => ErrorKind::UpstreamFetch,
            PredictionError::InsufficientData { .. } => ErrorKind::InsufficientData,
            PredictionError::Inference { .. } => ErrorKind::Inference,
            PredictionError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    pub fn upstream(reason: impl Into<String>) -> Self {
        PredictionError::UpstreamFetch {
            reason: reason.into(),
        }
    }

    pub fn inference(reason: impl Into<String>) -> Self {
        PredictionError::Inference {
            reason: reason.into(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        PredictionError::InvalidRequest {
            reason: reason.into(),
        }
    }
}

/// Fatal errors while loading the shared artifacts. The server must not start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Model configuration not found at {path}")]
    ConfigMissing { path: PathBuf },

    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Inconsistent model artifacts: {reason}")]
    Inconsistent { reason: String },
}

/// Failure to load the model pair of one horizon. Only ever logged; the
/// horizon is then unavailable for serving.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Model file not found: {path}")]
    Missing { path: PathBuf },

    #[error("Failed to load {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_horizon_message_names_hours() {
        let err = PredictionError::UnsupportedHorizon { hours: 3 };
        assert_eq!(err.to_string(), "Model for 3h not found");
        assert_eq!(err.kind(), ErrorKind::UnsupportedHorizon);
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let err = PredictionError::InsufficientData {
            required: 48,
            available: 12,
        };

        let msg = err.to_string();
        assert!(msg.contains("48"));
        assert!(msg.contains("12"));
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_startup_error_includes_path() {
        let err = StartupError::ConfigMissing {
            path: PathBuf::from("hybrid_models/model_config.json"),
        };
        assert!(err.to_string().contains("model_config.json"));
    }
}
