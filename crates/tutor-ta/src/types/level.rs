//! Level types - horizontal support and resistance prices.

use std::fmt;

use serde::{Deserialize, Serialize};
use tutor_core::Candle;

use crate::levels::LevelValidator;

/// Which side of price a level sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    /// Level below price that buyers defend.
    Support,
    /// Level above price that sellers defend.
    Resistance,
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelType::Support => f.write_str("support"),
            LevelType::Resistance => f.write_str("resistance"),
        }
    }
}

/// A horizontal price level.
///
/// `strength`, `touches` and `valid` are derived from candle data. Values
/// coming from static lesson configuration may be stale; call [`Level::rescored`]
/// instead of trusting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    /// Strength in `[0, 1]`.
    pub strength: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touches: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl Level {
    /// Create an unscored level.
    pub fn new(price: f64, level_type: LevelType) -> Self {
        Self {
            price,
            level_type,
            strength: 0.0,
            touches: None,
            valid: None,
        }
    }

    /// A level drawn by hand: default strength 0.5, no touches counted yet.
    pub fn drawn(price: f64, level_type: LevelType) -> Self {
        Self {
            price,
            level_type,
            strength: 0.5,
            touches: Some(0),
            valid: None,
        }
    }

    /// Recompute strength, touches and validity against the candles.
    pub fn rescored(mut self, candles: &[Candle], validator: &LevelValidator) -> Self {
        let result = validator.validate(self.price, candles);
        self.strength = result.strength;
        self.touches = result.touches;
        self.valid = Some(result.valid);
        self
    }

    #[inline]
    pub fn is_support(&self) -> bool {
        self.level_type == LevelType::Support
    }

    #[inline]
    pub fn is_resistance(&self) -> bool {
        self.level_type == LevelType::Resistance
    }
}
