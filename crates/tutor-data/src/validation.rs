//! Sanity checks for loaded candles.

use tutor_core::Candle;

/// Validate a candle has reasonable values.
pub fn validate_candle(candle: &Candle) -> bool {
    let prices = [candle.open, candle.high, candle.low, candle.close];

    prices.iter().all(|p| p.is_finite() && *p > 0.0)
        && candle.high >= candle.open.max(candle.close)
        && candle.low <= candle.open.min(candle.close)
        && candle.volume.map_or(true, |v| v.is_finite() && v >= 0.0)
}

/// Drop invalid candles and repeated timestamps, keeping the first of each.
///
/// Expects candles sorted by timestamp.
pub fn sanitize_candles(candles: Vec<Candle>) -> Vec<Candle> {
    let total = candles.len();
    let mut kept: Vec<Candle> = Vec::with_capacity(total);

    for candle in candles {
        if !validate_candle(&candle) {
            continue;
        }
        if kept.last().is_some_and(|last| last.timestamp == candle.timestamp) {
            continue;
        }
        kept.push(candle);
    }

    if kept.len() < total {
        log::warn!("Dropped {} of {} candles failing sanity checks", total - kept.len(), total);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_candle_valid() {
        let candle = Candle::new(1000, 100.0, 105.0, 95.0, 102.0, 1000.0);
        assert!(validate_candle(&candle));
        assert!(validate_candle(&Candle::ohlc(1000, 100.0, 105.0, 95.0, 102.0)));
    }

    #[test]
    fn test_validate_candle_high_below_low() {
        let candle = Candle::new(1000, 100.0, 90.0, 95.0, 102.0, 1000.0);
        assert!(!validate_candle(&candle));
    }

    #[test]
    fn test_validate_candle_body_outside_range() {
        let candle = Candle::ohlc(1000, 100.0, 101.0, 99.0, 103.0);
        assert!(!validate_candle(&candle));
    }

    #[test]
    fn test_validate_candle_nan() {
        let candle = Candle::ohlc(1000, f64::NAN, 105.0, 95.0, 102.0);
        assert!(!validate_candle(&candle));

        let negative_volume = Candle::new(1000, 100.0, 105.0, 95.0, 102.0, -1.0);
        assert!(!validate_candle(&negative_volume));
    }

    #[test]
    fn test_sanitize_drops_duplicates() {
        let candles = vec![
            Candle::ohlc(0, 100.0, 101.0, 99.0, 100.5),
            Candle::ohlc(0, 200.0, 201.0, 199.0, 200.5),
            Candle::ohlc(60_000, 100.0, 90.0, 99.0, 100.5),
            Candle::ohlc(120_000, 100.0, 101.0, 99.0, 100.5),
        ];
        let kept = sanitize_candles(candles);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].open, 100.0);
        assert_eq!(kept[1].timestamp, 120_000);
    }
}
