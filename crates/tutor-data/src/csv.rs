//! CSV data loading implementation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tutor_core::Candle;

use crate::error::DataError;
use crate::validation::sanitize_candles;
use crate::DataSource;

/// Numeric timestamps below this are taken as seconds, not milliseconds.
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Loads candle data from CSV files.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for CsvLoader {
    fn load(&self) -> anyhow::Result<Vec<Candle>> {
        let candles = load_candles_from_csv(&self.path)?;
        if candles.is_empty() {
            return Err(DataError::Empty(self.path.display().to_string()).into());
        }
        Ok(candles)
    }
}

/// Parse a timestamp into epoch milliseconds.
///
/// Accepts Unix seconds or milliseconds, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DDTHH:MM:SS` (UTC).
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(ts) = s.parse::<f64>() {
        if !ts.is_finite() {
            return None;
        }
        let ts = ts as i64;
        return Some(if ts.abs() < SECONDS_CUTOFF { ts * 1000 } else { ts });
    }

    let parts: Vec<&str> = s.split(['-', ' ', ':', 'T']).collect();
    if parts.len() < 6 {
        return None;
    }
    let year: i64 = parts[0].parse().ok()?;
    let month: usize = parts[1].parse().ok()?;
    let day: i64 = parts[2].parse().ok()?;
    let hour: i64 = parts[3].parse().ok()?;
    let min: i64 = parts[4].parse().ok()?;
    let sec: i64 = parts[5].trim_end_matches('Z').parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let is_leap = |y: i64| y % 4 == 0 && (y % 100 != 0 || y % 400 == 0);
    let mut days: i64 = (1970..year).map(|y| if is_leap(y) { 366 } else { 365 }).sum();
    const MONTH_DAYS: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    days += MONTH_DAYS[month - 1];
    if month > 2 && is_leap(year) {
        days += 1;
    }
    days += day - 1;

    Some((days * 86_400 + hour * 3600 + min * 60 + sec) * 1000)
}

/// Load candles from a CSV file.
pub fn load_candles_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>, DataError> {
    let reader = csv::ReaderBuilder::new().delimiter(b',').from_path(path)?;
    read_candles(reader)
}

/// Parse candles from any CSV reader.
///
/// Columns are found by header name (`timestamp`/`time`, `open`, `high`,
/// `low`, `close`, optional `volume`), falling back to that positional order.
/// Rows are returned sorted by timestamp; rows failing the sanity checks are
/// dropped.
pub fn parse_candles<R: io::Read>(input: R) -> Result<Vec<Candle>, DataError> {
    read_candles(csv::ReaderBuilder::new().delimiter(b',').from_reader(input))
}

fn read_candles<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Candle>, DataError> {
    let headers = reader.headers()?.clone();
    let headers_lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let column = |names: &[&str], fallback: usize| {
        headers_lower
            .iter()
            .position(|h| names.contains(&h.as_str()))
            .unwrap_or(fallback)
    };

    let ts_col = headers_lower
        .iter()
        .position(|h| h.contains("timestamp") || h == "time" || h == "date")
        .unwrap_or(0);
    let open_col = column(&["open"], 1);
    let high_col = column(&["high"], 2);
    let low_col = column(&["low"], 3);
    let close_col = column(&["close"], 4);
    let volume_col = headers_lower.iter().position(|h| h == "volume");

    let mut candles = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // 1-based, counting the header
        let row = i + 2;

        let raw_ts = record.get(ts_col).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| DataError::InvalidField {
            row,
            field: "timestamp",
            value: raw_ts.to_string(),
        })?;

        let price = |col: usize, field: &'static str| -> Result<f64, DataError> {
            let raw = record.get(col).unwrap_or("").trim();
            raw.parse().map_err(|_| DataError::InvalidField {
                row,
                field,
                value: raw.to_string(),
            })
        };

        let open = price(open_col, "open")?;
        let high = price(high_col, "high")?;
        let low = price(low_col, "low")?;
        let close = price(close_col, "close")?;
        let volume = match volume_col {
            Some(col) if !record.get(col).unwrap_or("").trim().is_empty() => Some(price(col, "volume")?),
            _ => None,
        };

        candles.push(Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    let candles = sanitize_candles(candles);

    let timestamps: Vec<i64> = candles.iter().map(|c| c.timestamp).collect();
    if let Some(report) = analyze_gaps(&timestamps) {
        log::info!(
            "Loaded {} candles, interval {} ms, {} gaps ({} missing)",
            candles.len(),
            report.interval_ms,
            report.gaps,
            report.missing
        );
    }

    Ok(candles)
}

/// Summary of holes in a candle timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapReport {
    /// Most common spacing, taken as the expected interval.
    pub interval_ms: i64,
    /// Number of spacings larger than the interval.
    pub gaps: usize,
    /// Candles missing inside those gaps.
    pub missing: i64,
    pub largest_gap_ms: i64,
}

/// Analyze sorted timestamps for gaps.
pub fn analyze_gaps(timestamps: &[i64]) -> Option<GapReport> {
    if timestamps.len() < 2 {
        return None;
    }

    let mut intervals: HashMap<i64, usize> = HashMap::new();
    for window in timestamps.windows(2) {
        *intervals.entry(window[1] - window[0]).or_insert(0) += 1;
    }

    // Ties go to the smaller interval
    let interval_ms = intervals
        .iter()
        .filter(|(interval, _)| **interval > 0)
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(interval, _)| *interval)?;

    let mut report = GapReport {
        interval_ms,
        gaps: 0,
        missing: 0,
        largest_gap_ms: 0,
    };

    for window in timestamps.windows(2) {
        let diff = window[1] - window[0];
        if diff > interval_ms {
            report.gaps += 1;
            report.missing += diff / interval_ms - 1;
            report.largest_gap_ms = report.largest_gap_ms.max(diff);
        }
    }

    Some(report)
}
