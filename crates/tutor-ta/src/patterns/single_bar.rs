//! Single-candle shapes.

use tutor_core::Candle;

use super::PatternRule;

/// Small body with a long lower shadow and a short upper shadow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hammer {
    /// Minimum lower shadow as a multiple of the body.
    pub min_lower_shadow: f64,
    /// Maximum upper shadow as a multiple of the body.
    pub max_upper_shadow: f64,
}

impl Hammer {
    pub const DEFAULT: Hammer = Hammer {
        min_lower_shadow: 2.0,
        max_upper_shadow: 0.5,
    };
}

impl Default for Hammer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PatternRule for Hammer {
    fn min_candles(&self) -> usize {
        1
    }

    fn matches_window(&self, window: &[Candle]) -> bool {
        let [candle] = window else { return false };
        let body = candle.body();
        body > 0.0
            && candle.lower_shadow() >= body * self.min_lower_shadow
            && candle.upper_shadow() <= body * self.max_upper_shadow
    }
}

/// Body no larger than a fraction of the full range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Doji {
    pub max_body_ratio: f64,
}

impl Doji {
    pub const DEFAULT: Doji = Doji { max_body_ratio: 0.1 };
}

impl Default for Doji {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PatternRule for Doji {
    fn min_candles(&self) -> usize {
        1
    }

    fn matches_window(&self, window: &[Candle]) -> bool {
        let [candle] = window else { return false };
        let range = candle.range();
        range > 0.0 && candle.body() <= range * self.max_body_ratio
    }
}
