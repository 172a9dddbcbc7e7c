//! Prevailing trend that a reversal pattern is read against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of the market leading into a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl Trend {
    /// Phrase used in validation messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Trend::Up => "an uptrend",
            Trend::Down => "a downtrend",
            Trend::Sideways => "a sideways market",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Sideways => "sideways",
        };
        f.write_str(s)
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            "sideways" => Ok(Trend::Sideways),
            other => Err(format!("unknown trend '{other}'")),
        }
    }
}
