//! MACD (Moving Average Convergence Divergence) indicator.

use serde::{Deserialize, Serialize};
use tutor_core::{Candle, IndicatorKind, IndicatorSeries, Signal, SignalType};

use crate::indicator::{Indicator, IndicatorConfig, PriceSource};

/// MACD indicator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    /// Fast EMA period (default: 12).
    pub fast_period: usize,
    /// Slow EMA period (default: 26).
    pub slow_period: usize,
    /// Signal line EMA period (default: 9).
    pub signal_period: usize,
    /// Price source for calculation.
    pub price_source: PriceSource,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for MacdConfig {}

/// All three MACD lines.
///
/// Each line carries the candle index of its first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdOutput {
    /// MACD line values (fast EMA - slow EMA).
    pub macd_line: Vec<f64>,
    pub macd_start: usize,
    /// Signal line values (EMA of MACD line).
    pub signal_line: Vec<f64>,
    /// Histogram values (MACD - Signal), aligned with the signal line.
    pub histogram: Vec<f64>,
    pub signal_start: usize,
}

impl MacdOutput {
    /// MACD line value at the given histogram index.
    #[inline]
    fn macd_at_histogram(&self, i: usize) -> f64 {
        self.macd_line[i + (self.signal_start - self.macd_start)]
    }
}

/// MACD indicator.
pub struct Macd {
    config: MacdConfig,
}

impl Indicator for Macd {
    type Config = MacdConfig;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        let warmup = self.warmup_offset();

        if candles.len() < self.min_periods() || !self.has_valid_periods() {
            return IndicatorSeries::empty(IndicatorKind::Macd, warmup);
        }

        let output = self.calculate_macd(candles);
        let signals = crossover_signals(&output);

        let series = IndicatorSeries {
            kind: IndicatorKind::Macd,
            timestamps: candles[output.signal_start..]
                .iter()
                .map(|c| c.timestamp)
                .collect(),
            values: output.histogram,
            signals,
            overbought: None,
            oversold: None,
            warmup_offset: output.signal_start,
        };
        log::debug!(
            "MACD({}, {}, {}): {} values, {} signals",
            self.config.fast_period,
            self.config.slow_period,
            self.config.signal_period,
            series.len(),
            series.signals.len()
        );
        series
    }

    fn min_periods(&self) -> usize {
        // A full slow window plus a full signal window, so at least two histogram bars exist
        self.config.slow_period.max(self.config.fast_period) + self.config.signal_period
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Macd
    }
}

impl Macd {
    /// Calculate all MACD lines.
    ///
    /// Returns empty lines when there is not enough data for a signal line.
    pub fn calculate_macd(&self, candles: &[Candle]) -> MacdOutput {
        let prices = self.config.price_source.extract_all(candles);
        let fast = self.config.fast_period;
        let slow = self.config.slow_period;
        let signal = self.config.signal_period;

        if !self.has_valid_periods() || prices.len() < slow.max(fast) {
            return MacdOutput::default();
        }

        let fast_ema = calculate_ema(&prices, fast);
        let slow_ema = calculate_ema(&prices, slow);

        // MACD line starts where the longer EMA has its first value
        let macd_start = slow.max(fast) - 1;
        let macd_line: Vec<f64> = (macd_start..prices.len())
            .map(|i| fast_ema[i + 1 - fast] - slow_ema[i + 1 - slow])
            .collect();

        let signal_line = calculate_ema(&macd_line, signal);
        let signal_start = macd_start + signal - 1;

        let histogram: Vec<f64> = signal_line
            .iter()
            .enumerate()
            .map(|(i, s)| macd_line[i + signal - 1] - s)
            .collect();

        MacdOutput {
            macd_line,
            macd_start,
            signal_line,
            histogram,
            signal_start,
        }
    }

    /// Candle index of the first histogram value.
    pub fn warmup_offset(&self) -> usize {
        (self.config.slow_period.max(self.config.fast_period) + self.config.signal_period)
            .saturating_sub(2)
    }

    /// Get the configuration.
    pub fn config(&self) -> &MacdConfig {
        &self.config
    }

    fn has_valid_periods(&self) -> bool {
        self.config.fast_period > 0 && self.config.slow_period > 0 && self.config.signal_period > 0
    }
}

/// Compute the MACD histogram series with crossover signals.
pub fn compute_macd(
    candles: &[Candle],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> IndicatorSeries {
    Macd::new(MacdConfig {
        fast_period,
        slow_period,
        signal_period,
        ..Default::default()
    })
    .calculate(candles)
}

/// Buy when the MACD line crosses above the signal line, sell on the cross below.
fn crossover_signals(output: &MacdOutput) -> Vec<Signal> {
    let mut signals = Vec::new();

    for i in 1..output.signal_line.len() {
        let macd = output.macd_at_histogram(i);
        let prev_macd = output.macd_at_histogram(i - 1);
        let sig = output.signal_line[i];
        let prev_sig = output.signal_line[i - 1];

        let signal_type = if macd > sig && prev_macd <= prev_sig {
            SignalType::Buy
        } else if macd < sig && prev_macd >= prev_sig {
            SignalType::Sell
        } else {
            continue;
        };

        let denominator = if macd == 0.0 { 1.0 } else { macd.abs() };
        signals.push(Signal::new(i, signal_type, (macd - sig).abs() / denominator));
    }

    signals
}

/// Calculate Exponential Moving Average.
///
/// The first value is the SMA of the first `period` prices.
fn calculate_ema(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.len() < period || period == 0 {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema_values = Vec::with_capacity(prices.len() - period + 1);

    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    ema_values.push(ema);

    for price in &prices[period..] {
        ema = (price - ema) * multiplier + ema;
        ema_values.push(ema);
    }

    ema_values
}
