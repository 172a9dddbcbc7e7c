//! Core types for technical analysis.

pub mod direction;
pub mod level;
pub mod structure;
pub mod trend;
pub mod validation;

pub use direction::CandleDirection;
pub use level::{Level, LevelType};
pub use structure::{Extremum, NecklinePoint, PatternPoint, PointRole, StructureKind, StructurePattern};
pub use trend::Trend;
pub use validation::ValidationResult;
