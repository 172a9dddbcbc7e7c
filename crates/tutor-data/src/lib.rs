//! Data loading utilities for the candle tutor.
//!
//! Candles come from CSV files, from memory, or from the synthetic
//! generators used to build lesson exercises.

pub mod csv;
pub mod error;
pub mod source;
pub mod synthetic;
pub mod validation;

pub use self::csv::{analyze_gaps, parse_candles, CsvLoader, GapReport};
pub use error::DataError;
pub use source::{DataSource, MemorySource};
pub use synthetic::{CandleGenerator, SyntheticPattern, SyntheticSource};
pub use validation::{sanitize_candles, validate_candle};
