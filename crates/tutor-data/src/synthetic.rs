//! Synthetic candle generation for lessons and demos.
//!
//! Random walks and trends use the generator's RNG. Pattern shapes are
//! deterministic so the validators always recognise them; only their volume
//! is random.

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tutor_core::Candle;
use tutor_ta::{PatternKind, Trend};

use crate::DataSource;

/// Default candle spacing: 15 minutes.
pub const DEFAULT_INTERVAL_MS: i64 = 15 * 60 * 1000;

/// Default maximum per-candle move: 0.2% of price.
pub const DEFAULT_VOLATILITY: f64 = 0.002;

/// Shape appended by [`CandleGenerator::with_pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticPattern {
    Candle(PatternKind),
    HeadAndShoulders,
    InverseHeadAndShoulders,
}

impl FromStr for SyntheticPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head-and-shoulders" => Ok(SyntheticPattern::HeadAndShoulders),
            "inverse-head-and-shoulders" => Ok(SyntheticPattern::InverseHeadAndShoulders),
            other => other.parse().map(SyntheticPattern::Candle),
        }
    }
}

/// Waypoints of the Head-and-Shoulders close path: (candle offset, pips from the neckline).
const HEAD_AND_SHOULDERS_PATH: [(usize, f64); 7] = [
    (0, -10.0),
    (6, 30.0),
    (10, 0.0),
    (16, 50.0),
    (21, 0.0),
    (26, 30.0),
    (30, -15.0),
];

/// Candle template in pips relative to an anchor price: (open, high, low, close).
type Template = (f64, f64, f64, f64);

/// Seedable generator of candle sequences.
pub struct CandleGenerator {
    rng: StdRng,
    start_time: i64,
    interval_ms: i64,
    /// Maximum per-candle move as a fraction of price.
    volatility: f64,
}

impl CandleGenerator {
    /// Create a generator; `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            start_time: 0,
            interval_ms: DEFAULT_INTERVAL_MS,
            volatility: DEFAULT_VOLATILITY,
        }
    }

    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_interval(mut self, interval_ms: i64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Random walk of `count` candles starting at `start_price`.
    pub fn random_walk(&mut self, count: usize, start_price: f64) -> Vec<Candle> {
        let mut price = start_price;
        (0..count)
            .map(|i| {
                let scale = price * self.volatility;
                let change = (self.rng.gen::<f64>() - 0.5) * scale * 2.0;
                let candle = self.wiggle(self.time_at(i), price, change, scale);
                price = candle.close;
                candle
            })
            .collect()
    }

    /// Drifting walk: a fixed step per candle in the trend direction plus noise.
    pub fn trend(&mut self, count: usize, trend: Trend, start_price: f64) -> Vec<Candle> {
        let direction = match trend {
            Trend::Up => 1.0,
            Trend::Down => -1.0,
            Trend::Sideways => 0.0,
        };

        let mut price = start_price;
        (0..count)
            .map(|i| {
                let step = price * self.volatility * 0.25;
                let noise = (self.rng.gen::<f64>() - 0.5) * step;
                let candle = self.wiggle(self.time_at(i), price, direction * step + noise, step * 0.6);
                price = candle.close;
                candle
            })
            .collect()
    }

    /// Append `pattern` after `base`, anchored at its last close.
    pub fn with_pattern(&mut self, mut base: Vec<Candle>, pattern: SyntheticPattern) -> Vec<Candle> {
        let anchor = base.last().map_or(100.0, |c| c.close);
        let first_time = base
            .last()
            .map_or(self.start_time, |c| c.timestamp + self.interval_ms);

        let templates = match pattern {
            SyntheticPattern::Candle(kind) => candle_templates(kind),
            SyntheticPattern::HeadAndShoulders => head_and_shoulders(false),
            SyntheticPattern::InverseHeadAndShoulders => head_and_shoulders(true),
        };

        let pip = anchor * 1e-4;
        for (i, (open, high, low, close)) in templates.into_iter().enumerate() {
            let volume = self.rng.gen_range(300.0..700.0);
            base.push(Candle::new(
                first_time + i as i64 * self.interval_ms,
                anchor + open * pip,
                anchor + high * pip,
                anchor + low * pip,
                anchor + close * pip,
                volume,
            ));
        }

        log::debug!("Generated {} candles with {:?}", base.len(), pattern);
        base
    }

    fn time_at(&self, index: usize) -> i64 {
        self.start_time + index as i64 * self.interval_ms
    }

    fn wiggle(&mut self, timestamp: i64, open: f64, change: f64, scale: f64) -> Candle {
        let close = open + change;
        let range = change.abs() + self.rng.gen::<f64>() * scale;
        let high = open.max(close) + self.rng.gen::<f64>() * range * 0.5;
        let low = open.min(close) - self.rng.gen::<f64>() * range * 0.5;
        let volume = self.rng.gen::<f64>() * 1000.0 + 100.0;
        Candle::new(timestamp, open, high, low, close, volume)
    }
}

fn candle_templates(kind: PatternKind) -> Vec<Template> {
    let bullish = match kind {
        PatternKind::Hammer | PatternKind::HangingMan => vec![(-5.0, -1.0, -20.0, -2.0)],
        PatternKind::Doji => vec![(0.0, 10.0, -10.0, 0.5)],
        PatternKind::BullishEngulfing | PatternKind::BearishEngulfing => {
            vec![(0.0, 2.0, -15.0, -10.0), (-12.0, 8.0, -15.0, 5.0)]
        }
        PatternKind::MorningStar | PatternKind::EveningStar => vec![
            (0.0, 2.0, -15.0, -10.0),
            (-12.0, -8.0, -15.0, -11.0),
            (-11.0, 8.0, -15.0, 5.0),
        ],
    };

    match kind {
        PatternKind::BearishEngulfing | PatternKind::EveningStar => bullish.into_iter().map(mirror).collect(),
        _ => bullish,
    }
}

/// Reflect a template around the anchor price.
fn mirror((open, high, low, close): Template) -> Template {
    (-open, -low, -high, -close)
}

/// Piecewise-linear close path through the waypoints. Turning candles get a
/// longer wick so each peak and trough is strictly extreme.
fn head_and_shoulders(inverse: bool) -> Vec<Template> {
    let last = HEAD_AND_SHOULDERS_PATH[HEAD_AND_SHOULDERS_PATH.len() - 1].0;
    let turns = &HEAD_AND_SHOULDERS_PATH[1..HEAD_AND_SHOULDERS_PATH.len() - 1];

    let closes: Vec<f64> = (0..=last)
        .map(|k| {
            HEAD_AND_SHOULDERS_PATH
                .windows(2)
                .find(|w| k <= w[1].0)
                .map_or(0.0, |w| {
                    let ((a, va), (b, vb)) = (w[0], w[1]);
                    va + (vb - va) * (k - a) as f64 / (b - a) as f64
                })
        })
        .collect();

    closes
        .iter()
        .enumerate()
        .map(|(k, &close)| {
            let open = if k == 0 { close - 2.0 } else { closes[k - 1] };
            let wick = if turns.iter().any(|(t, _)| *t == k) { 4.0 } else { 2.0 };
            let template = (open, open.max(close) + wick, open.min(close) - wick, close);
            if inverse {
                mirror(template)
            } else {
                template
            }
        })
        .collect()
}

/// [`DataSource`] producing synthetic candles.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub count: usize,
    pub start_price: f64,
    pub interval_ms: i64,
    /// Timestamp of the first candle, epoch ms.
    pub start_time: i64,
    /// Maximum per-candle move as a fraction of price.
    pub volatility: f64,
    pub seed: Option<u64>,
    /// Shape appended after the random walk.
    pub pattern: Option<SyntheticPattern>,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            count: 60,
            start_price: 100.0,
            interval_ms: DEFAULT_INTERVAL_MS,
            start_time: 0,
            volatility: DEFAULT_VOLATILITY,
            seed: None,
            pattern: None,
        }
    }
}

impl DataSource for SyntheticSource {
    fn load(&self) -> anyhow::Result<Vec<Candle>> {
        anyhow::ensure!(self.start_price > 0.0, "start price must be positive");
        anyhow::ensure!(self.volatility >= 0.0, "volatility must not be negative");

        let mut generator = CandleGenerator::new(self.seed)
            .with_start_time(self.start_time)
            .with_interval(self.interval_ms)
            .with_volatility(self.volatility);
        let candles = generator.random_walk(self.count, self.start_price);

        Ok(match self.pattern {
            Some(pattern) => generator.with_pattern(candles, pattern),
            None => candles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_ta::{detect_head_and_shoulders, validate_pattern, PatternContext, StructureKind};

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let a = CandleGenerator::new(Some(7)).random_walk(50, 1.08);
        let b = CandleGenerator::new(Some(7)).random_walk(50, 1.08);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_walk_is_well_formed() {
        let candles = CandleGenerator::new(Some(1)).random_walk(200, 100.0);

        assert_eq!(candles.len(), 200);
        for pair in candles.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
            assert_eq!(pair[1].timestamp - pair[0].timestamp, DEFAULT_INTERVAL_MS);
        }
        for c in &candles {
            assert!(c.high >= c.open.max(c.close));
            assert!(c.low <= c.open.min(c.close));
        }
    }

    #[test]
    fn test_trend_direction() {
        let up = CandleGenerator::new(Some(3)).trend(100, Trend::Up, 100.0);
        let down = CandleGenerator::new(Some(3)).trend(100, Trend::Down, 100.0);
        assert!(up[99].close > up[0].open);
        assert!(down[99].close < down[0].open);
    }

    #[test]
    fn test_candle_patterns_validate() {
        let mut generator = CandleGenerator::new(Some(5));
        for kind in PatternKind::ALL {
            let candles = generator.with_pattern(Vec::new(), SyntheticPattern::Candle(kind));
            assert_eq!(candles.len(), kind.window());
            let result = validate_pattern(kind, &candles, &PatternContext::default());
            assert!(result.valid, "{kind}: {}", result.message);
        }
    }

    #[test]
    fn test_head_and_shoulders_is_detected() {
        let mut generator = CandleGenerator::new(Some(9));
        let candles = generator.with_pattern(Vec::new(), SyntheticPattern::HeadAndShoulders);
        assert_eq!(candles.len(), 31);

        let pattern = detect_head_and_shoulders(&candles, false).expect("pattern");
        assert_eq!(pattern.kind, StructureKind::Normal);
        assert_eq!(
            [pattern.left().index, pattern.head().index, pattern.right().index],
            [6, 16, 26]
        );
        assert_eq!(pattern.neckline[0].index, 10);
        assert_eq!(pattern.neckline[1].index, 21);
    }

    #[test]
    fn test_inverse_head_and_shoulders_is_detected() {
        let mut generator = CandleGenerator::new(Some(9));
        let candles = generator.with_pattern(Vec::new(), SyntheticPattern::InverseHeadAndShoulders);

        let pattern = detect_head_and_shoulders(&candles, true).expect("pattern");
        assert_eq!(pattern.head().index, 16);
        assert!(detect_head_and_shoulders(&candles, false).is_none());
    }

    #[test]
    fn test_pattern_continues_base_timeline() {
        let mut generator = CandleGenerator::new(Some(2));
        let base = generator.random_walk(10, 50.0);
        let last = base[9];
        let candles = generator.with_pattern(base, SyntheticPattern::Candle(PatternKind::Hammer));

        assert_eq!(candles.len(), 11);
        assert_eq!(candles[10].timestamp, last.timestamp + DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn test_parse_synthetic_pattern() {
        assert_eq!(
            "inverse-head-and-shoulders".parse::<SyntheticPattern>(),
            Ok(SyntheticPattern::InverseHeadAndShoulders)
        );
        assert_eq!(
            "doji".parse::<SyntheticPattern>(),
            Ok(SyntheticPattern::Candle(PatternKind::Doji))
        );
        assert!("triangle".parse::<SyntheticPattern>().is_err());
    }

    #[test]
    fn test_synthetic_source() {
        let source = SyntheticSource {
            count: 40,
            seed: Some(4),
            pattern: Some(SyntheticPattern::Candle(PatternKind::MorningStar)),
            ..Default::default()
        };
        assert_eq!(source.load().unwrap().len(), 43);

        let bad = SyntheticSource {
            start_price: 0.0,
            ..Default::default()
        };
        assert!(bad.load().is_err());
    }

    #[test]
    fn test_synthetic_source_start_time_and_volatility() {
        let source = SyntheticSource {
            count: 10,
            start_time: 1_700_000_000_000,
            interval_ms: 60_000,
            volatility: 0.0,
            seed: Some(9),
            ..Default::default()
        };
        let candles = source.load().unwrap();

        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[9].timestamp, 1_700_000_000_000 + 9 * 60_000);
        // No volatility: every candle is flat at the start price
        assert!(candles
            .iter()
            .all(|c| c.open == 100.0 && c.close == 100.0 && c.high == 100.0 && c.low == 100.0));

        let negative = SyntheticSource {
            volatility: -0.1,
            ..Default::default()
        };
        assert!(negative.load().is_err());
    }
}
