//! RSI (Relative Strength Index) indicator.

use serde::{Deserialize, Serialize};
use tutor_core::{Candle, IndicatorKind, IndicatorSeries, Signal, SignalType};

use crate::indicator::{Indicator, IndicatorConfig, PriceSource};

/// RSI indicator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    /// Number of price deltas averaged per value (default: 14).
    pub period: usize,
    /// Level above which the market is considered overbought (default: 70).
    pub overbought: f64,
    /// Level below which the market is considered oversold (default: 30).
    pub oversold: f64,
    /// Price source for calculation.
    pub price_source: PriceSource,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for RsiConfig {}

/// RSI over simple (not Wilder-smoothed) averages of gains and losses.
pub struct Rsi {
    config: RsiConfig,
}

impl Indicator for Rsi {
    type Config = RsiConfig;

    fn new(config: Self::Config) -> Self {
        Self { config }
    }

    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        let period = self.config.period;
        let warmup = self.warmup_offset();

        if period == 0 || candles.len() < self.min_periods() {
            return IndicatorSeries::empty(IndicatorKind::Rsi, warmup);
        }

        let values = self.calculate_values(candles);
        let timestamps = candles[warmup..].iter().map(|c| c.timestamp).collect();
        let signals = self.threshold_signals(&values);

        log::debug!(
            "RSI({}): {} values, {} signals",
            period,
            values.len(),
            signals.len()
        );

        IndicatorSeries {
            kind: IndicatorKind::Rsi,
            values,
            timestamps,
            signals,
            overbought: Some(self.config.overbought),
            oversold: Some(self.config.oversold),
            warmup_offset: warmup,
        }
    }

    fn min_periods(&self) -> usize {
        self.config.period + 1
    }

    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }
}

impl Rsi {
    /// Candle index of the first RSI value.
    ///
    /// One candle is consumed by the delta array and `period` more by the
    /// first averaging window.
    pub fn warmup_offset(&self) -> usize {
        self.config.period + 1
    }

    /// Get the configuration.
    pub fn config(&self) -> &RsiConfig {
        &self.config
    }

    fn calculate_values(&self, candles: &[Candle]) -> Vec<f64> {
        let period = self.config.period;
        let prices = self.config.price_source.extract_all(candles);

        let (gains, losses): (Vec<f64>, Vec<f64>) = prices
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        (period..gains.len())
            .map(|i| {
                let avg_gain = gains[i - period..i].iter().sum::<f64>() / period as f64;
                let avg_loss = losses[i - period..i].iter().sum::<f64>() / period as f64;

                if avg_loss == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
                }
            })
            .collect()
    }

    /// Buy on entering the oversold band, sell on entering the overbought band.
    fn threshold_signals(&self, values: &[f64]) -> Vec<Signal> {
        let oversold = self.config.oversold;
        let overbought = self.config.overbought;
        let oversold_span = oversold.max(f64::EPSILON);
        let overbought_span = (100.0 - overbought).max(f64::EPSILON);

        values
            .windows(2)
            .enumerate()
            .filter_map(|(i, w)| {
                let (prev, curr) = (w[0], w[1]);
                if curr < oversold && prev >= oversold {
                    Some(Signal::new(i + 1, SignalType::Buy, (oversold - curr) / oversold_span))
                } else if curr > overbought && prev <= overbought {
                    Some(Signal::new(i + 1, SignalType::Sell, (curr - overbought) / overbought_span))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Compute the RSI series with overbought/oversold entry signals.
pub fn compute_rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    Rsi::new(RsiConfig {
        period,
        ..Default::default()
    })
    .calculate(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle::ohlc(i as i64 * 60_000, close, close + 0.5, close - 0.5, close))
            .collect()
    }

    #[test]
    fn test_insufficient_data() {
        for len in 0..=14 {
            let candles = make_candles(&vec![100.0; len]);
            let series = compute_rsi(&candles, 14);
            assert!(series.values.is_empty());
            assert!(series.signals.is_empty());
            assert!(series.timestamps.is_empty());
        }
    }

    #[test]
    fn test_alignment_with_candles() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 4.0).collect();
        let candles = make_candles(&closes);
        let series = compute_rsi(&candles, 14);

        // 39 deltas, first window ends at delta 14
        assert_eq!(series.values.len(), 40 - 1 - 14);
        assert_eq!(series.timestamps.len(), series.values.len());
        assert_eq!(series.warmup_offset, 15);
        for (i, ts) in series.timestamps.iter().enumerate() {
            assert_eq!(*ts, candles[i + 15].timestamp);
        }
    }

    #[test]
    fn test_values_in_range() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 50.0 + (i as f64 * 0.37).sin() * 10.0 + (i as f64 * 0.11).cos() * 3.0)
            .collect();
        let series = compute_rsi(&make_candles(&closes), 14);

        assert!(!series.is_empty());
        assert!(series.values.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn test_monotonic_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = compute_rsi(&make_candles(&closes), 14);

        assert!(series.values.iter().all(|v| *v == 100.0));
        assert_eq!(series.signals_of(SignalType::Sell).count(), 0);
    }

    #[test]
    fn test_known_value() {
        // Window of 14 deltas: 7 gains of 2, 7 losses of 1
        let mut closes = vec![100.0];
        for i in 0..16 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let series = compute_rsi(&make_candles(&closes), 14);

        // avg gain 1.0, avg loss 0.5 => RS 2 => RSI 66.67
        assert!((series.values[0] - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_oversold_entry_signal() {
        // Flat-ish start, then a steady decline pushes RSI under 30
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        closes.extend((1..=20).map(|i| 100.0 - i as f64 * 1.5));
        let series = compute_rsi(&make_candles(&closes), 14);

        let buys: Vec<_> = series.signals_of(SignalType::Buy).collect();
        assert_eq!(buys.len(), 1);
        let signal = buys[0];
        assert!(series.values[signal.index] < 30.0);
        assert!(series.values[signal.index - 1] >= 30.0);
        assert!((0.0..=1.0).contains(&signal.strength));
        assert_eq!(series.signals_of(SignalType::Sell).count(), 0);
    }
}
