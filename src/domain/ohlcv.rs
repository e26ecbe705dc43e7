//! OHLCV bar and series representation.

use crate::domain::timeframe::Timeframe;
use chrono::{DateTime, Utc};

/// One bar. `timestamp` is the bar open time in epoch milliseconds (UTC).
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Time-ordered bars for one symbol and timeframe. Timestamps are strictly
/// increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<OhlcvBar>,
}

impl OhlcvSeries {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<OhlcvBar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn empty(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self::new(symbol, timeframe, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// (first, last) timestamps, if any.
    pub fn span(&self) -> Option<(i64, i64)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}
