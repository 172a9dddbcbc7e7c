//! Candle Tutor technical analysis - validators for lesson exercises.
//!
//! Everything in this crate is a pure function over an immutable candle slice.
//! Validators never fail: a negative answer is a [`ValidationResult`] with
//! `valid == false` and a message, "no answer" is `None` or an empty collection.
//!
//! # Components
//!
//! - **Patterns**: single, two and three candle reversal patterns
//! - **Structure**: local extrema and Head-and-Shoulders detection
//! - **Levels**: support/resistance scoring by counting touches
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tutor_ta::{validate_pattern, validate_level, PatternContext, PatternKind, Trend};
//!
//! let result = validate_pattern(
//!     PatternKind::BullishEngulfing,
//!     &candles,
//!     &PatternContext::with_trend(Trend::Down),
//! );
//! if result.valid {
//!     println!("{} ({:.2})", result.message, result.strength);
//! }
//!
//! let level = validate_level(1.0850, &candles, 0.0005);
//! println!("{} touches", level.touches.unwrap_or(0));
//! ```

pub mod levels;
pub mod patterns;
pub mod structure;
pub mod types;

pub use levels::{support_resistance, validate_level, LevelValidator, Tolerance};
pub use patterns::{
    scan_patterns, validate_pattern, validate_pattern_id, PatternContext, PatternKind,
    PatternMatch, PatternRule,
};
pub use structure::{detect_head_and_shoulders, find_extrema, StructureDetector};
pub use types::{
    CandleDirection, Extremum, Level, LevelType, NecklinePoint, PatternPoint,
    PointRole, StructureKind, StructurePattern, Trend, ValidationResult,
};
