pub mod assembler;
pub mod indicators;

pub use assembler::FeatureAssembler;
pub use indicators::compute_features;
