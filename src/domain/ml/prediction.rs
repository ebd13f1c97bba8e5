use super::horizon::Horizon;
use crate::domain::errors::PredictionError;
use serde::Serialize;

/// Probability-of-up above which a prediction is UP.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

/// Thresholded classifier output. `confidence` is always within [0.5, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: f64,
    pub probability_up: f64,
}

impl Prediction {
    pub fn from_probability(probability_up: f64) -> Result<Self, PredictionError> {
        if !(0.0..=1.0).contains(&probability_up) {
            return Err(PredictionError::inference(format!(
                "classifier returned {} which is not a probability",
                probability_up
            )));
        }

        let (direction, confidence) = if probability_up > DECISION_THRESHOLD {
            (Direction::Up, probability_up)
        } else {
            (Direction::Down, 1.0 - probability_up)
        };

        Ok(Self {
            direction,
            confidence,
            probability_up,
        })
    }

    pub fn probability_down(&self) -> f64 {
        1.0 - self.probability_up
    }
}

/// Outcome of one served request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub symbol: String,
    pub requested_minutes: i64,
    pub horizon: Horizon,
    pub model_used: String,
    pub prediction: Prediction,
    pub current_price: f64,
}
