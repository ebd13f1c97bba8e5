use crate::domain::errors::{ModelLoadError, PredictionError};
use crate::domain::ports::SequenceEncoder;
use ndarray::Array3;
use ort::session::Session;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// LSTM sequence encoder exported to ONNX. Input `[1, W, F]` f32, output a
/// single `[1, K]` tensor.
pub struct OnnxSequenceEncoder {
    session: Mutex<Session>,
}

impl OnnxSequenceEncoder {
    pub fn load(model_path: &Path) -> Result<Self, ModelLoadError> {
        if !model_path.exists() {
            return Err(ModelLoadError::Missing {
                path: model_path.to_path_buf(),
            });
        }

        let invalid = |reason: String| ModelLoadError::Invalid {
            path: model_path.to_path_buf(),
            reason,
        };

        let session = Session::builder()
            .map_err(|e| invalid(format!("Failed to create ONNX session builder: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| invalid(format!("Failed to load ONNX model: {}", e)))?;

        info!("Successfully loaded ONNX encoder from {:?}", model_path);
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl SequenceEncoder for OnnxSequenceEncoder {
    fn encode(&self, window: &Array3<f32>) -> Result<Vec<f32>, PredictionError> {
        let shape = window.shape().to_vec();
        let flat_data: Vec<f32> = window.iter().copied().collect();

        let input_value = ort::value::Value::from_array((shape.as_slice(), flat_data))
            .map_err(|e| PredictionError::inference(format!("Input value creation failed: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictionError::inference(format!("Mutex lock failed: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| PredictionError::inference(e.to_string()))?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| PredictionError::inference("No output found"))?;
        let (_, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| PredictionError::inference(e.to_string()))?;

        if data.is_empty() {
            return Err(PredictionError::inference("Empty encoder output"));
        }
        Ok(data.to_vec())
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}
