//! Data loading errors.

use thiserror::Error;

/// Errors raised while loading candle data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: invalid {field} value '{value}'")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("No usable candles in {0}")]
    Empty(String),
}
