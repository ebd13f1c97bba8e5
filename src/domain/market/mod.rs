pub mod candle;
pub mod symbol;

pub use candle::Candle;
