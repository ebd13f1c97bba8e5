use serde::Serialize;
use std::fmt;

/// Discrete lead time, in hours, that a model pair is trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Horizon(u32);

/// Horizons with trained model pairs, in declared order. Resolution ties go to
/// the earlier entry.
pub const PREDICTION_HORIZONS: [Horizon; 6] = [
    Horizon(1),
    Horizon(2),
    Horizon(3),
    Horizon(4),
    Horizon(6),
    Horizon(12),
];

impl Horizon {
    pub const fn from_hours(hours: u32) -> Self {
        Horizon(hours)
    }

    pub const fn hours(self) -> u32 {
        self.0
    }

    /// Maps a requested lead time in minutes to the nearest declared horizon.
    ///
    /// Minutes are converted to whole hours rounding half away from zero
    /// (150 -> 3); zero hours is clamped to one. The nearest horizon by
    /// absolute difference wins, the first declared one on a tie.
    pub fn resolve(minutes: i64) -> Horizon {
        let mut target = (minutes as f64 / 60.0).round() as i64;
        if target == 0 {
            target = 1;
        }

        PREDICTION_HORIZONS
            .iter()
            .copied()
            .min_by_key(|h| (i64::from(h.0) - target).abs())
            .unwrap_or(PREDICTION_HORIZONS[0])
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}
