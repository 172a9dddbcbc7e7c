//! Two- and three-candle reversal shapes.

use tutor_core::Candle;

use super::PatternRule;

/// Second candle's body swallows the opposite-coloured first candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engulfing {
    pub bullish: bool,
}

impl Engulfing {
    pub const BULLISH: Engulfing = Engulfing { bullish: true };
    pub const BEARISH: Engulfing = Engulfing { bullish: false };
}

impl PatternRule for Engulfing {
    fn min_candles(&self) -> usize {
        2
    }

    fn matches_window(&self, window: &[Candle]) -> bool {
        let [prev, curr] = window else { return false };
        if self.bullish {
            prev.is_bearish() && curr.is_bullish() && curr.open < prev.close && curr.close > prev.open
        } else {
            prev.is_bullish() && curr.is_bearish() && curr.open > prev.close && curr.close < prev.open
        }
    }
}

/// Strong candle, small-bodied pause, strong candle the other way closing
/// past the first candle's midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Morning star (bullish) when true, evening star otherwise.
    pub morning: bool,
    /// Middle body must be smaller than this fraction of the first body.
    pub max_middle_body: f64,
}

impl Star {
    pub const MORNING: Star = Star {
        morning: true,
        max_middle_body: 0.3,
    };
    pub const EVENING: Star = Star {
        morning: false,
        max_middle_body: 0.3,
    };
}

impl PatternRule for Star {
    fn min_candles(&self) -> usize {
        3
    }

    fn matches_window(&self, window: &[Candle]) -> bool {
        let [first, second, third] = window else { return false };
        let small_middle = second.body() < first.body() * self.max_middle_body;
        let midpoint = first.body_mid();

        if self.morning {
            first.is_bearish() && small_middle && third.is_bullish() && third.close > midpoint
        } else {
            first.is_bullish() && small_middle && third.is_bearish() && third.close < midpoint
        }
    }
}
