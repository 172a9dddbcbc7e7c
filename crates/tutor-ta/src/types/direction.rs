//! Direction a pattern points the market.

use serde::{Deserialize, Serialize};

/// Expected move after a pattern completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleDirection {
    Bullish,
    Bearish,
    /// Indecision; no direction implied.
    Neutral,
}

impl CandleDirection {
    pub fn opposite(self) -> Self {
        match self {
            CandleDirection::Bullish => CandleDirection::Bearish,
            CandleDirection::Bearish => CandleDirection::Bullish,
            CandleDirection::Neutral => CandleDirection::Neutral,
        }
    }

    pub fn is_directional(self) -> bool {
        self != CandleDirection::Neutral
    }
}
