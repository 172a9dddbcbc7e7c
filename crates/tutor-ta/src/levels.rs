//! Support/resistance level scoring.

use serde::{Deserialize, Serialize};
use tutor_core::Candle;

use crate::types::ValidationResult;

/// Distance from a level within which a candle's high or low counts as a touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum Tolerance {
    /// Fixed price distance.
    Absolute(f64),
    /// Fraction of the level price.
    Relative(f64),
}

impl Tolerance {
    /// Price distance for a level at `price`.
    #[inline]
    pub fn threshold(&self, price: f64) -> f64 {
        match *self {
            Tolerance::Absolute(distance) => distance,
            Tolerance::Relative(fraction) => fraction * price.abs(),
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Absolute(0.01)
    }
}

/// Scores a horizontal level by counting candle touches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelValidator {
    pub tolerance: Tolerance,
    /// Touches needed for the level to be valid.
    pub min_touches: usize,
    /// Touches at which strength saturates at 1.0.
    pub full_strength_touches: usize,
}

impl Default for LevelValidator {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            min_touches: 2,
            full_strength_touches: 5,
        }
    }
}

impl LevelValidator {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }

    /// Count candles whose high or low lies within tolerance of `price`.
    pub fn count_touches(&self, price: f64, candles: &[Candle]) -> usize {
        let threshold = self.tolerance.threshold(price);
        candles
            .iter()
            .filter(|c| (c.high - price).abs().min((c.low - price).abs()) <= threshold)
            .count()
    }

    pub fn validate(&self, price: f64, candles: &[Candle]) -> ValidationResult {
        if candles.is_empty() {
            return ValidationResult::no_data();
        }

        let touches = self.count_touches(price, candles);
        let strength = (touches as f64 / self.full_strength_touches.max(1) as f64).min(1.0);

        let result = if touches < self.min_touches {
            ValidationResult::fail(
                strength,
                format!(
                    "Weak level: only {} touch(es), at least {} needed",
                    touches, self.min_touches
                ),
            )
        } else if strength < 0.5 {
            ValidationResult::pass(strength, format!("Level confirmed, but weak ({touches} touches)"))
        } else {
            ValidationResult::pass(strength, format!("Strong level ({touches} touches)"))
        };

        result.with_touches(touches)
    }
}

/// Validate a level with an absolute touch threshold and default touch counts.
pub fn validate_level(price: f64, candles: &[Candle], threshold: f64) -> ValidationResult {
    LevelValidator::new(Tolerance::Absolute(threshold)).validate(price, candles)
}

/// Rough support and resistance from rolling `lookback` windows.
///
/// Each window covers the `lookback` candles before an index, so the most
/// recent candle never contributes. Sequences no longer than the lookback fall
/// back to the first candle's low and high.
pub fn support_resistance(candles: &[Candle], lookback: usize) -> Option<(f64, f64)> {
    let first = candles.first()?;
    if lookback == 0 {
        return None;
    }

    if candles.len() <= lookback {
        return Some((first.low, first.high));
    }

    // Union of all windows [i - lookback, i) for i in lookback..len
    let covered = &candles[..candles.len() - 1];
    let support = covered.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = covered.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

    Some((support, resistance))
}
