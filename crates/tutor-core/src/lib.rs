//! Core types for the candle tutor.
//!
//! This crate provides the shared data contract consumed by every analysis component:
//! - `Candle` - OHLCV candle data
//! - `IndicatorSeries` - Indicator output aligned to the source candles
//! - `Signal` - Buy/sell events raised by an indicator

pub mod candle;
pub mod series;

pub use candle::{Candle, OHLCV};
pub use series::{IndicatorKind, IndicatorSeries, Signal, SignalType};
