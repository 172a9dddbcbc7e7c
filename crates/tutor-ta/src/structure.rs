//! Head-and-Shoulders structure detection over a full candle sequence.

use serde::{Deserialize, Serialize};
use tutor_core::Candle;

use crate::types::{
    Extremum, NecklinePoint, PatternPoint, PointRole, StructureKind, StructurePattern,
};

/// Neighbours on each side an extremum must strictly beat.
const EXTREMUM_RADIUS: usize = 2;

/// Offset of the fallback neckline anchor from the preceding point.
const NECKLINE_FALLBACK_OFFSET: usize = 3;

/// Head-and-Shoulders detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureDetector {
    /// Sequences shorter than this are never scanned.
    pub min_candles: usize,
    /// Maximum relative difference between the two shoulders.
    pub shoulder_tolerance: f64,
}

impl Default for StructureDetector {
    fn default() -> Self {
        Self {
            min_candles: 20,
            shoulder_tolerance: 0.05,
        }
    }
}

impl StructureDetector {
    /// Find the first Head-and-Shoulders structure of the given orientation.
    pub fn detect(&self, candles: &[Candle], kind: StructureKind) -> Option<StructurePattern> {
        if candles.len() < self.min_candles.max(2 * EXTREMUM_RADIUS + 1) {
            return None;
        }

        let inverse = kind == StructureKind::Inverse;
        let extrema = find_extrema(candles, inverse);

        let found = extrema.windows(3).find_map(|triple| {
            let (left, head, right) = (triple[0], triple[1], triple[2]);

            let head_is_extreme = if inverse {
                head.price < left.price && head.price < right.price
            } else {
                head.price > left.price && head.price > right.price
            };
            if !head_is_extreme || !self.shoulders_level(left, right) {
                return None;
            }

            Some(StructurePattern {
                kind,
                points: [
                    PatternPoint::new(PointRole::Left, left),
                    PatternPoint::new(PointRole::Head, head),
                    PatternPoint::new(PointRole::Right, right),
                ],
                neckline: [
                    neckline_anchor(candles, left.index, head.index, inverse),
                    neckline_anchor(candles, head.index, right.index, inverse),
                ],
            })
        });

        if let Some(pattern) = &found {
            log::debug!(
                "{:?} head-and-shoulders: left {}, head {}, right {}",
                kind,
                pattern.left().index,
                pattern.head().index,
                pattern.right().index
            );
        }
        found
    }

    fn shoulders_level(&self, left: Extremum, right: Extremum) -> bool {
        let scale = left.price.abs();
        scale > 0.0 && (left.price - right.price).abs() / scale < self.shoulder_tolerance
    }
}

/// Local highs (lows when `inverse`) that strictly beat the two candles on
/// each side. The first and last two candles are never extrema.
pub fn find_extrema(candles: &[Candle], inverse: bool) -> Vec<Extremum> {
    let price = |c: &Candle| if inverse { c.low } else { c.high };

    candles
        .windows(2 * EXTREMUM_RADIUS + 1)
        .enumerate()
        .filter_map(|(start, window)| {
            let center = price(&window[EXTREMUM_RADIUS]);
            let beats_all = window
                .iter()
                .enumerate()
                .filter(|(offset, _)| *offset != EXTREMUM_RADIUS)
                .all(|(_, c)| if inverse { center < price(c) } else { center > price(c) });

            beats_all.then(|| Extremum {
                index: start + EXTREMUM_RADIUS,
                price: center,
            })
        })
        .collect()
}

/// Detect with the default detector settings.
pub fn detect_head_and_shoulders(candles: &[Candle], inverse: bool) -> Option<StructurePattern> {
    let kind = if inverse {
        StructureKind::Inverse
    } else {
        StructureKind::Normal
    };
    StructureDetector::default().detect(candles, kind)
}

/// Lowest low (highest high when inverse) in `[start, end)`, first occurrence wins.
fn neckline_anchor(candles: &[Candle], start: usize, end: usize, inverse: bool) -> NecklinePoint {
    let best = candles[start..end]
        .iter()
        .enumerate()
        .map(|(offset, c)| (start + offset, if inverse { c.high } else { c.low }))
        .filter(|(_, p)| p.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (index, p)| match best {
            Some((_, current)) if (inverse && p <= current) || (!inverse && p >= current) => best,
            _ => Some((index, p)),
        });

    match best {
        Some((index, price)) => NecklinePoint { index, price },
        None => {
            let index = (start + NECKLINE_FALLBACK_OFFSET).min(candles.len() - 1);
            let candle = &candles[index];
            NecklinePoint {
                index,
                price: if inverse { candle.high } else { candle.low },
            }
        }
    }
}
