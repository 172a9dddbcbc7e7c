//! Candle data structures for OHLCV data.

use serde::{Deserialize, Serialize};

/// OHLCV candle.
///
/// Prices are expected to satisfy `low <= min(open, close)` and
/// `high >= max(open, close)`. Nothing here enforces it; shadow lengths are
/// meaningless for candles that violate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time as epoch milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: Some(volume),
        }
    }

    /// Candle without volume information.
    pub fn ohlc(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Absolute body size.
    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Top of the body.
    #[inline]
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Bottom of the body.
    #[inline]
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Midpoint of the body.
    #[inline]
    pub fn body_mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    #[inline]
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.body_top()
    }

    #[inline]
    pub fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low
    }

    /// Total range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Trait for types that provide OHLCV data.
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadows_bullish() {
        let candle = Candle::ohlc(0, 100.0, 115.0, 95.0, 110.0);
        assert_eq!(candle.body(), 10.0);
        assert_eq!(candle.upper_shadow(), 5.0);
        assert_eq!(candle.lower_shadow(), 5.0);
        assert_eq!(candle.range(), 20.0);
        assert!(candle.is_bullish());
    }

    #[test]
    fn test_shadows_bearish() {
        let candle = Candle::ohlc(0, 110.0, 112.0, 90.0, 100.0);
        assert_eq!(candle.body_top(), 110.0);
        assert_eq!(candle.body_bottom(), 100.0);
        assert_eq!(candle.upper_shadow(), 2.0);
        assert_eq!(candle.lower_shadow(), 10.0);
        assert!(candle.is_bearish());
    }

    #[test]
    fn test_volume_is_optional_in_json() {
        let candle: Candle =
            serde_json::from_str(r#"{"timestamp":1,"open":1.0,"high":2.0,"low":0.5,"close":1.5}"#)
                .unwrap();
        assert_eq!(candle.volume, None);
        assert_eq!(OHLCV::volume(&candle), 0.0);

        let json = serde_json::to_string(&candle).unwrap();
        assert!(!json.contains("volume"));
    }
}
