//! Catalogue of the columns the indicator engine produces, and the ordered
//! feature schema the models were trained on.
//!
//! Column names are the exact names used at training time. Renaming any of
//! them silently zero-fills that feature for every model.

use std::fmt;

/// Every column of a computed feature table, raw candle fields included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorColumn {
    Timestamp,
    Open,
    High,
    Low,
    Close,
    Volume,
    Rsi,
    Macd,
    MacdSignal,
    MacdHistogram,
    BollingerLower,
    BollingerMiddle,
    BollingerUpper,
    BollingerBandwidth,
    BollingerPosition,
    Returns,
    LogReturns,
    Volatility,
    Momentum,
    RateOfChange,
    VolumeSma,
    VolumeRatio,
}

impl IndicatorColumn {
    pub const COUNT: usize = 22;

    /// Declared column order of the feature table.
    pub const ALL: [IndicatorColumn; Self::COUNT] = [
        IndicatorColumn::Timestamp,
        IndicatorColumn::Open,
        IndicatorColumn::High,
        IndicatorColumn::Low,
        IndicatorColumn::Close,
        IndicatorColumn::Volume,
        IndicatorColumn::Rsi,
        IndicatorColumn::Macd,
        IndicatorColumn::MacdSignal,
        IndicatorColumn::MacdHistogram,
        IndicatorColumn::BollingerLower,
        IndicatorColumn::BollingerMiddle,
        IndicatorColumn::BollingerUpper,
        IndicatorColumn::BollingerBandwidth,
        IndicatorColumn::BollingerPosition,
        IndicatorColumn::Returns,
        IndicatorColumn::LogReturns,
        IndicatorColumn::Volatility,
        IndicatorColumn::Momentum,
        IndicatorColumn::RateOfChange,
        IndicatorColumn::VolumeSma,
        IndicatorColumn::VolumeRatio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndicatorColumn::Timestamp => "Timestamp",
            IndicatorColumn::Open => "Open",
            IndicatorColumn::High => "High",
            IndicatorColumn::Low => "Low",
            IndicatorColumn::Close => "Close",
            IndicatorColumn::Volume => "Volume",
            IndicatorColumn::Rsi => "RSI_14",
            IndicatorColumn::Macd => "MACD_12_26_9",
            IndicatorColumn::MacdSignal => "MACDs_12_26_9",
            IndicatorColumn::MacdHistogram => "MACDh_12_26_9",
            IndicatorColumn::BollingerLower => "BBL_5_2.0",
            IndicatorColumn::BollingerMiddle => "BBM_5_2.0",
            IndicatorColumn::BollingerUpper => "BBU_5_2.0",
            IndicatorColumn::BollingerBandwidth => "BBB_5_2.0",
            IndicatorColumn::BollingerPosition => "BBP_5_2.0",
            IndicatorColumn::Returns => "Returns",
            IndicatorColumn::LogReturns => "Log_Returns",
            IndicatorColumn::Volatility => "Volatility_20",
            IndicatorColumn::Momentum => "Momentum_10",
            IndicatorColumn::RateOfChange => "ROC_10",
            IndicatorColumn::VolumeSma => "Volume_SMA_20",
            IndicatorColumn::VolumeRatio => "Volume_Ratio",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.name() == name)
    }

    /// Position of the column in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for IndicatorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named input slot of the model. `column` is `None` when the name does
/// not match any computed column; such slots are fed zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSlot {
    pub name: String,
    pub column: Option<IndicatorColumn>,
}

/// Ordered feature list shared by the scaler and every model pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    slots: Vec<FeatureSlot>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let column = IndicatorColumn::from_name(&name);
                FeatureSlot { name, column }
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[FeatureSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Names that will be zero-filled at serving time.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|slot| slot.column.is_none())
            .map(|slot| slot.name.as_str())
    }
}
