//! Technical indicator engine
//!
//! Computes the fixed indicator set the models were trained on:
//! - RSI (simple moving average of gains/losses)
//! - MACD line, signal and histogram (recursive EMA seeded at the first close)
//! - Bollinger bands with raw bandwidth and band position
//! - Simple and log returns, rolling volatility of returns
//! - Momentum and rate of change
//! - Volume SMA and volume ratio
//!
//! Rolling statistics need a full window of defined inputs; rows before that
//! are `None`. A 0/0 result is also `None`. Infinite results are kept.

use crate::domain::market::Candle;
use crate::domain::ml::feature_registry::IndicatorColumn;
use crate::domain::ml::feature_table::{Column, FeatureTable};
use statrs::statistics::{Data, Distribution};
use ta::Next;
use ta::indicators::ExponentialMovingAverage;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_LENGTH: usize = 5;
pub const BOLLINGER_STD_MULTIPLIER: f64 = 2.0;
pub const VOLATILITY_WINDOW: usize = 20;
pub const MOMENTUM_LAG: usize = 10;
pub const VOLUME_WINDOW: usize = 20;

fn defined(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn lift(values: &[f64]) -> Column {
    values.iter().map(|&v| defined(v)).collect()
}

fn zip_with(a: &[Option<f64>], b: &[Option<f64>], f: impl Fn(f64, f64) -> f64) -> Column {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => defined(f(*x, *y)),
            _ => None,
        })
        .collect()
}

/// Applies `f` to each trailing window of `window` values. Windows containing
/// an undefined value, and the first `window - 1` rows, yield `None`.
fn rolling(values: &[Option<f64>], window: usize, f: impl Fn(Vec<f64>) -> Option<f64>) -> Column {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = values[i + 1 - window..=i].iter().copied().collect();
            slice.and_then(&f).and_then(defined)
        })
        .collect()
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Column {
    rolling(values, window, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Rolling sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Column {
    rolling(values, window, |w| Data::new(w).std_dev())
}

/// Difference from the value `lag` rows earlier.
pub fn lagged(values: &[f64], lag: usize, f: impl Fn(f64, f64) -> f64) -> Column {
    (0..values.len())
        .map(|i| {
            if i < lag || lag == 0 {
                return None;
            }
            defined(f(values[i], values[i - lag]))
        })
        .collect()
}

/// Recursive EMA with `alpha = 2 / (span + 1)`, seeded at the first defined
/// input. Undefined inputs stay undefined and do not advance the average.
pub fn ema(values: &[Option<f64>], span: usize) -> Column {
    match ExponentialMovingAverage::new(span) {
        Ok(mut ema) => values.iter().map(|v| v.map(|x| ema.next(x))).collect(),
        Err(_) => vec![None; values.len()],
    }
}

pub fn rsi(closes: &[f64], period: usize) -> Column {
    let delta = lagged(closes, 1, |current, previous| current - previous);
    let gains: Column = delta.iter().map(|d| d.map(|d| d.max(0.0))).collect();
    let losses: Column = delta.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    zip_with(&avg_gain, &avg_loss, |gain, loss| {
        let ratio = gain / loss;
        100.0 - 100.0 / (1.0 + ratio)
    })
}

pub struct Macd {
    pub line: Column,
    pub signal: Column,
    pub histogram: Column,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let closes = lift(closes);
    let ema_fast = ema(&closes, fast);
    let ema_slow = ema(&closes, slow);
    let line = zip_with(&ema_fast, &ema_slow, |f, s| f - s);
    let signal = ema(&line, signal);
    let histogram = zip_with(&line, &signal, |m, s| m - s);
    Macd {
        line,
        signal,
        histogram,
    }
}

pub struct Bollinger {
    pub lower: Column,
    pub middle: Column,
    pub upper: Column,
    pub bandwidth: Column,
    pub position: Column,
}

/// Bollinger bands. Position divides by the bandwidth unguarded, so a
/// constant window gives 0/0 and an undefined position.
pub fn bollinger(closes: &[f64], length: usize, multiplier: f64) -> Bollinger {
    let lifted = lift(closes);
    let middle = rolling_mean(&lifted, length);
    let std = rolling_std(&lifted, length);

    let upper = zip_with(&middle, &std, |m, s| m + s * multiplier);
    let lower = zip_with(&middle, &std, |m, s| m - s * multiplier);
    let bandwidth = zip_with(&upper, &lower, |u, l| u - l);
    let offset = zip_with(&lifted, &lower, |c, l| c - l);
    let position = zip_with(&offset, &bandwidth, |o, b| o / b);

    Bollinger {
        lower,
        middle,
        upper,
        bandwidth,
        position,
    }
}

pub fn pct_change(values: &[f64]) -> Column {
    lagged(values, 1, |current, previous| (current - previous) / previous)
}

pub fn log_returns(values: &[f64]) -> Column {
    lagged(values, 1, |current, previous| (current / previous).ln())
}

/// Builds the full feature table for a candle series, oldest first.
pub fn compute_features(candles: &[Candle]) -> FeatureTable {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let raw = |f: fn(&Candle) -> f64| -> Column { candles.iter().map(|c| defined(f(c))).collect() };

    let mut table = FeatureTable::with_len(candles.len());
    table.insert(IndicatorColumn::Timestamp, raw(|c| c.timestamp as f64));
    table.insert(IndicatorColumn::Open, raw(|c| c.open));
    table.insert(IndicatorColumn::High, raw(|c| c.high));
    table.insert(IndicatorColumn::Low, raw(|c| c.low));
    table.insert(IndicatorColumn::Close, lift(&closes));
    table.insert(IndicatorColumn::Volume, lift(&volumes));

    table.insert(IndicatorColumn::Rsi, rsi(&closes, RSI_PERIOD));

    let macd = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    table.insert(IndicatorColumn::Macd, macd.line);
    table.insert(IndicatorColumn::MacdSignal, macd.signal);
    table.insert(IndicatorColumn::MacdHistogram, macd.histogram);

    let bands = bollinger(&closes, BOLLINGER_LENGTH, BOLLINGER_STD_MULTIPLIER);
    table.insert(IndicatorColumn::BollingerLower, bands.lower);
    table.insert(IndicatorColumn::BollingerMiddle, bands.middle);
    table.insert(IndicatorColumn::BollingerUpper, bands.upper);
    table.insert(IndicatorColumn::BollingerBandwidth, bands.bandwidth);
    table.insert(IndicatorColumn::BollingerPosition, bands.position);

    let returns = pct_change(&closes);
    table.insert(
        IndicatorColumn::Volatility,
        rolling_std(&returns, VOLATILITY_WINDOW),
    );
    table.insert(IndicatorColumn::Returns, returns);
    table.insert(IndicatorColumn::LogReturns, log_returns(&closes));

    table.insert(
        IndicatorColumn::Momentum,
        lagged(&closes, MOMENTUM_LAG, |current, past| current - past),
    );
    table.insert(
        IndicatorColumn::RateOfChange,
        lagged(&closes, MOMENTUM_LAG, |current, past| (current - past) / past * 100.0),
    );

    let volume_sma = rolling_mean(&lift(&volumes), VOLUME_WINDOW);
    let volume_ratio = zip_with(&lift(&volumes), &volume_sma, |v, sma| v / sma);
    table.insert(IndicatorColumn::VolumeSma, volume_sma);
    table.insert(IndicatorColumn::VolumeRatio, volume_ratio);

    table
}
