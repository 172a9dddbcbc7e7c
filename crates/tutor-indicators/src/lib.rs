//! Indicator engine for technical analysis.
//!
//! Every indicator is a pure function of a candle slice. Too little history
//! produces an empty [`IndicatorSeries`](tutor_core::IndicatorSeries), never an error.

pub mod indicator;
pub mod macd;
pub mod rsi;

pub use indicator::{Indicator, IndicatorConfig, PriceSource};
pub use macd::{compute_macd, Macd, MacdConfig, MacdOutput};
pub use rsi::{compute_rsi, Rsi, RsiConfig};
