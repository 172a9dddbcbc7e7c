//! Data source trait definition.

use tutor_core::Candle;

/// Trait for types that can load candle data.
///
/// This trait uses `anyhow::Result` for flexible error handling.
pub trait DataSource {
    fn load(&self) -> anyhow::Result<Vec<Candle>>;
}

/// Candles already in memory, e.g. embedded in a lesson definition.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    candles: Vec<Candle>,
}

impl MemorySource {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }
}

impl DataSource for MemorySource {
    fn load(&self) -> anyhow::Result<Vec<Candle>> {
        Ok(self.candles.clone())
    }
}
