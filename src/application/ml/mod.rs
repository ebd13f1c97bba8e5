pub mod model_registry;
pub mod onnx_encoder;
pub mod scaler;
pub mod xgboost;

pub use model_registry::{ModelPair, ModelRegistry};
