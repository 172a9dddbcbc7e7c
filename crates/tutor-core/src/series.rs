//! Indicator output aligned to the candle sequence it was computed from.

use serde::{Deserialize, Serialize};

/// Which indicator produced a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Rsi,
    Macd,
}

impl IndicatorKind {
    pub fn label(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
        }
    }
}

/// Direction of an indicator signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Neutral,
}

/// A buy/sell event raised by an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Index into the series' `values`, not into the candle sequence.
    pub index: usize,
    pub signal_type: SignalType,
    /// Normalized strength in `[0, 1]`.
    pub strength: f64,
}

impl Signal {
    /// Create a signal, clamping `strength` into `[0, 1]`.
    pub fn new(index: usize, signal_type: SignalType, strength: f64) -> Self {
        let strength = if strength.is_finite() {
            strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            index,
            signal_type,
            strength,
        }
    }
}

/// Output of an indicator calculation.
///
/// `values[i]` belongs to `timestamps[i]` and to candle `i + warmup_offset`.
/// An empty series means the candle history was too short, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<f64>,
    pub timestamps: Vec<i64>,
    pub signals: Vec<Signal>,
    pub overbought: Option<f64>,
    pub oversold: Option<f64>,
    /// Candle index of `values[0]`.
    pub warmup_offset: usize,
}

impl IndicatorSeries {
    /// Creates an empty series for the given indicator.
    pub fn empty(kind: IndicatorKind, warmup_offset: usize) -> Self {
        Self {
            kind,
            values: Vec::new(),
            timestamps: Vec::new(),
            signals: Vec::new(),
            overbought: None,
            oversold: None,
            warmup_offset,
        }
    }

    /// Returns the number of values in this series.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there was not enough history to compute a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Candle index that `values[value_index]` corresponds to.
    #[inline]
    pub fn candle_index(&self, value_index: usize) -> usize {
        value_index + self.warmup_offset
    }

    /// Gets the value computed for the given candle index, if available.
    pub fn value_at_candle(&self, candle_index: usize) -> Option<f64> {
        if candle_index < self.warmup_offset {
            return None;
        }
        self.values.get(candle_index - self.warmup_offset).copied()
    }

    /// Most recent value.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Returns an iterator over (candle index, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (i + self.warmup_offset, *v))
    }

    /// Signals of the given type.
    pub fn signals_of(&self, signal_type: SignalType) -> impl Iterator<Item = &Signal> {
        self.signals
            .iter()
            .filter(move |s| s.signal_type == signal_type)
    }
}
