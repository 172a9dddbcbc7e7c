//! Candlestick reversal patterns.
//!
//! Each [`PatternKind`] is backed by a [`PatternRule`] that decides whether the
//! geometry of the last one to three candles matches. The trend context only
//! affects validity, never the geometric match.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tutor_core::Candle;

use crate::types::{CandleDirection, Trend, ValidationResult};

mod multi_bar;
mod single_bar;

pub use multi_bar::{Engulfing, Star};
pub use single_bar::{Doji, Hammer};

/// Trait for geometric candle rules.
///
/// Rules are stateless and look only at the last `min_candles()` candles of
/// the slice they are given.
pub trait PatternRule: Send + Sync {
    /// Number of candles the rule inspects.
    fn min_candles(&self) -> usize;

    /// Evaluate the rule on exactly `min_candles()` candles, oldest first.
    fn matches_window(&self, window: &[Candle]) -> bool;

    /// Evaluate the rule on the tail of `candles`.
    fn matches(&self, candles: &[Candle]) -> bool {
        let n = self.min_candles();
        candles.len() >= n && self.matches_window(&candles[candles.len() - n..])
    }
}

/// The closed set of patterns with a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    Hammer,
    HangingMan,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    Doji,
}

impl PatternKind {
    /// Every pattern kind, in catalog order.
    pub const ALL: [PatternKind; 7] = [
        PatternKind::Hammer,
        PatternKind::HangingMan,
        PatternKind::BullishEngulfing,
        PatternKind::BearishEngulfing,
        PatternKind::MorningStar,
        PatternKind::EveningStar,
        PatternKind::Doji,
    ];

    /// Kebab-case identifier used by lesson content.
    pub fn id(&self) -> &'static str {
        match self {
            PatternKind::Hammer => "hammer",
            PatternKind::HangingMan => "hanging-man",
            PatternKind::BullishEngulfing => "bullish-engulfing",
            PatternKind::BearishEngulfing => "bearish-engulfing",
            PatternKind::MorningStar => "morning-star",
            PatternKind::EveningStar => "evening-star",
            PatternKind::Doji => "doji",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::Hammer => "Hammer",
            PatternKind::HangingMan => "Hanging Man",
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::MorningStar => "Morning Star",
            PatternKind::EveningStar => "Evening Star",
            PatternKind::Doji => "Doji",
        }
    }

    /// Number of candles the pattern spans.
    pub fn window(&self) -> usize {
        self.rule().min_candles()
    }

    /// Strength reported when the geometry matches, reflecting relative reliability.
    pub fn strength(&self) -> f64 {
        match self {
            PatternKind::Hammer | PatternKind::HangingMan => 0.8,
            PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => 0.9,
            PatternKind::MorningStar | PatternKind::EveningStar => 0.95,
            PatternKind::Doji => 0.7,
        }
    }

    /// Trend the pattern must appear in to count as a reversal.
    pub fn expected_trend(&self) -> Option<Trend> {
        match self {
            PatternKind::Hammer | PatternKind::BullishEngulfing | PatternKind::MorningStar => {
                Some(Trend::Down)
            }
            PatternKind::HangingMan | PatternKind::BearishEngulfing | PatternKind::EveningStar => {
                Some(Trend::Up)
            }
            PatternKind::Doji => None,
        }
    }

    /// Direction the pattern points to.
    pub fn bias(&self) -> CandleDirection {
        match self.expected_trend() {
            Some(Trend::Down) => CandleDirection::Bullish,
            Some(Trend::Up) => CandleDirection::Bearish,
            _ => CandleDirection::Neutral,
        }
    }

    /// Geometric rule behind this pattern.
    pub fn rule(&self) -> &'static dyn PatternRule {
        static HAMMER: Hammer = Hammer::DEFAULT;
        static BULLISH_ENGULFING: Engulfing = Engulfing::BULLISH;
        static BEARISH_ENGULFING: Engulfing = Engulfing::BEARISH;
        static MORNING_STAR: Star = Star::MORNING;
        static EVENING_STAR: Star = Star::EVENING;
        static DOJI: Doji = Doji::DEFAULT;

        match self {
            // Hanging man is a hammer shape after an uptrend
            PatternKind::Hammer | PatternKind::HangingMan => &HAMMER,
            PatternKind::BullishEngulfing => &BULLISH_ENGULFING,
            PatternKind::BearishEngulfing => &BEARISH_ENGULFING,
            PatternKind::MorningStar => &MORNING_STAR,
            PatternKind::EveningStar => &EVENING_STAR,
            PatternKind::Doji => &DOJI,
        }
    }

    /// Whether the tail of `candles` has this pattern's geometry.
    #[inline]
    pub fn matches(&self, candles: &[Candle]) -> bool {
        self.rule().matches(candles)
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| format!("unknown pattern '{s}'"))
    }
}

/// Market context a pattern is read in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternContext {
    /// Prevailing trend; `None` accepts any trend.
    pub trend: Option<Trend>,
}

impl PatternContext {
    pub fn with_trend(trend: Trend) -> Self {
        Self { trend: Some(trend) }
    }
}

/// Validate that the last candles of `candles` form `kind`.
///
/// Callers slice the window they care about; only the last
/// `kind.window()` candles are inspected.
pub fn validate_pattern(kind: PatternKind, candles: &[Candle], context: &PatternContext) -> ValidationResult {
    if candles.is_empty() {
        return ValidationResult::no_data();
    }

    let window = kind.window();
    if candles.len() < window {
        return ValidationResult::fail(
            0.0,
            format!("{} needs at least {} candles", kind.label(), window),
        );
    }

    let geometry = kind.matches(candles);
    let trend_ok = match (kind.expected_trend(), context.trend) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => true,
    };
    let strength = if geometry { kind.strength() } else { 0.0 };

    match (geometry, trend_ok) {
        (true, true) if kind == PatternKind::Doji => {
            ValidationResult::pass(strength, "Valid Doji: the market is undecided")
        }
        (true, true) => ValidationResult::pass(strength, format!("Valid {}", kind.label())),
        (true, false) => {
            let expected = kind.expected_trend().map_or("any trend", |t| t.describe());
            ValidationResult::fail(
                strength,
                format!("{} found, but it is expected in {}", kind.label(), expected),
            )
        }
        (false, _) => ValidationResult::fail(0.0, format!("Does not match the {} pattern", kind.label())),
    }
}

/// Validate by string identifier.
///
/// Identifiers without a rule pass with strength 0.5. This permissive default
/// keeps lesson content with unrecognised ids usable; typed callers should use
/// [`validate_pattern`] with a [`PatternKind`].
pub fn validate_pattern_id(pattern_id: &str, candles: &[Candle], context: &PatternContext) -> ValidationResult {
    if candles.is_empty() {
        return ValidationResult::no_data();
    }

    match pattern_id.parse::<PatternKind>() {
        Ok(kind) => validate_pattern(kind, candles, context),
        Err(_) => {
            log::warn!("No validation rule for pattern '{}', accepting", pattern_id);
            ValidationResult::pass(0.5, format!("No validation rule defined for '{pattern_id}'"))
        }
    }
}

/// A pattern found by [`scan_patterns`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    /// Index of the last candle of the pattern.
    pub end_index: usize,
    /// Index of the first candle of the pattern.
    pub start_index: usize,
    pub strength: f64,
    pub bias: CandleDirection,
}

/// Find every geometric occurrence of `kinds` in the sequence.
///
/// Trend context is not applied, so a hammer shape is reported both as
/// hammer and hanging man. Results are ordered by end index, then by the
/// order of `kinds`.
pub fn scan_patterns(candles: &[Candle], kinds: &[PatternKind]) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = (0..candles.len())
        .into_par_iter()
        .flat_map_iter(|end| {
            let history = &candles[..=end];
            kinds.iter().filter(move |kind| kind.matches(history)).map(move |kind| PatternMatch {
                kind: *kind,
                end_index: end,
                start_index: end + 1 - kind.window(),
                strength: kind.strength(),
                bias: kind.bias(),
            })
        })
        .collect();

    matches.sort_by_key(|m| m.end_index);
    log::debug!("Pattern scan over {} candles: {} matches", candles.len(), matches.len());
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::ohlc(0, open, high, low, close)
    }

    fn bullish_engulfing() -> Vec<Candle> {
        vec![c(10.0, 10.2, 8.8, 9.0), c(8.8, 10.6, 8.7, 10.5)]
    }

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for kind in PatternKind::ALL {
            assert_eq!(kind.id().parse::<PatternKind>(), Ok(kind));
        }
        assert!("head-and-shoulders".parse::<PatternKind>().is_err());
    }

    #[test]
    fn test_windows() {
        assert_eq!(PatternKind::Hammer.window(), 1);
        assert_eq!(PatternKind::Doji.window(), 1);
        assert_eq!(PatternKind::BearishEngulfing.window(), 2);
        assert_eq!(PatternKind::EveningStar.window(), 3);
    }

    #[test]
    fn test_bullish_engulfing_trend_gate() {
        let candles = bullish_engulfing();

        let unset = validate_pattern(PatternKind::BullishEngulfing, &candles, &PatternContext::default());
        assert!(unset.valid);
        assert_eq!(unset.strength, 0.9);

        let down = validate_pattern(
            PatternKind::BullishEngulfing,
            &candles,
            &PatternContext::with_trend(Trend::Down),
        );
        assert!(down.valid);

        let up = validate_pattern(
            PatternKind::BullishEngulfing,
            &candles,
            &PatternContext::with_trend(Trend::Up),
        );
        assert!(!up.valid);
        assert_eq!(up.strength, 0.9);
        assert!(up.message.contains("expected in a downtrend"));
    }

    #[test]
    fn test_wrong_trend_message_differs_from_mismatch() {
        let hammer = vec![c(10.0, 10.11, 7.0, 10.1)];
        let wrong_trend = validate_pattern(PatternKind::Hammer, &hammer, &PatternContext::with_trend(Trend::Up));
        let mismatch = validate_pattern(
            PatternKind::BullishEngulfing,
            &[c(10.0, 11.0, 9.0, 10.5), c(10.5, 11.0, 9.0, 10.0)],
            &PatternContext::default(),
        );

        assert!(!wrong_trend.valid && !mismatch.valid);
        assert_ne!(wrong_trend.message, mismatch.message);
        assert_eq!(mismatch.strength, 0.0);
    }

    #[test]
    fn test_sideways_is_wrong_trend_for_reversals() {
        let result = validate_pattern(
            PatternKind::BullishEngulfing,
            &bullish_engulfing(),
            &PatternContext::with_trend(Trend::Sideways),
        );
        assert!(!result.valid);
    }

    #[test]
    fn test_doji_ignores_trend() {
        let doji = vec![c(10.0, 11.0, 9.0, 10.05)];
        for trend in [Trend::Up, Trend::Down, Trend::Sideways] {
            let result = validate_pattern(PatternKind::Doji, &doji, &PatternContext::with_trend(trend));
            assert!(result.valid);
            assert_eq!(result.strength, 0.7);
        }
    }

    #[test]
    fn test_morning_star_rejects_bearish_third_candle() {
        let candles = vec![
            c(10.0, 10.2, 8.9, 9.0),
            c(8.0, 9.4, 7.9, 9.2),
            c(8.5, 8.6, 5.8, 6.0),
        ];
        let result = validate_pattern(PatternKind::MorningStar, &candles, &PatternContext::default());
        assert!(!result.valid);
        assert_eq!(result.strength, 0.0);
    }

    #[test]
    fn test_too_few_candles() {
        let result = validate_pattern(
            PatternKind::MorningStar,
            &bullish_engulfing(),
            &PatternContext::default(),
        );
        assert!(!result.valid);
        assert!(result.message.contains("3 candles"));

        let empty = validate_pattern(PatternKind::Doji, &[], &PatternContext::default());
        assert!(!empty.valid);
        assert_eq!(empty.strength, 0.0);
    }

    #[test]
    fn test_only_tail_is_inspected() {
        let mut candles = vec![c(10.0, 10.1, 9.0, 9.5); 5];
        candles.extend(bullish_engulfing());
        let result = validate_pattern(PatternKind::BullishEngulfing, &candles, &PatternContext::default());
        assert!(result.valid);
    }

    #[test]
    fn test_unknown_id_is_permissive() {
        let result = validate_pattern_id("bull-flag", &bullish_engulfing(), &PatternContext::default());
        assert!(result.valid);
        assert_eq!(result.strength, 0.5);

        let known = validate_pattern_id("bullish-engulfing", &bullish_engulfing(), &PatternContext::default());
        assert_eq!(known.strength, 0.9);

        let empty = validate_pattern_id("bull-flag", &[], &PatternContext::default());
        assert!(!empty.valid);
    }

    #[test]
    fn test_scan_finds_patterns_in_order() {
        let candles = vec![
            c(10.0, 10.2, 9.9, 10.1),
            c(10.0, 10.2, 8.8, 9.0),
            c(8.8, 10.6, 8.7, 10.5),
            c(10.5, 11.5, 9.5, 10.52),
        ];
        let found = scan_patterns(&candles, &PatternKind::ALL);

        let engulfing: Vec<_> = found
            .iter()
            .filter(|m| m.kind == PatternKind::BullishEngulfing)
            .collect();
        assert_eq!(engulfing.len(), 1);
        assert_eq!(engulfing[0].end_index, 2);
        assert_eq!(engulfing[0].start_index, 1);
        assert_eq!(engulfing[0].bias, CandleDirection::Bullish);

        assert!(found.iter().any(|m| m.kind == PatternKind::Doji && m.end_index == 3));
        assert!(found.windows(2).all(|w| w[0].end_index <= w[1].end_index));
    }
}
