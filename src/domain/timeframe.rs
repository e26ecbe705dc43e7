//! Bar timeframes (`1m`, `4h`, `1d`, ...) and their durations.

use crate::domain::error::CoinwatchError;
use std::fmt;
use std::str::FromStr;

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    Minute,
    Hour,
    Day,
    Week,
}

impl TimeframeUnit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'm' => Some(TimeframeUnit::Minute),
            'h' => Some(TimeframeUnit::Hour),
            'd' => Some(TimeframeUnit::Day),
            'w' => Some(TimeframeUnit::Week),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            TimeframeUnit::Minute => 'm',
            TimeframeUnit::Hour => 'h',
            TimeframeUnit::Day => 'd',
            TimeframeUnit::Week => 'w',
        }
    }

    pub fn millis(&self) -> i64 {
        match self {
            TimeframeUnit::Minute => MINUTE_MS,
            TimeframeUnit::Hour => HOUR_MS,
            TimeframeUnit::Day => DAY_MS,
            TimeframeUnit::Week => WEEK_MS,
        }
    }
}

/// A bar aggregation period: a positive count of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    count: u32,
    unit: TimeframeUnit,
}

impl Timeframe {
    pub fn new(count: u32, unit: TimeframeUnit) -> Result<Self, CoinwatchError> {
        if count == 0 {
            return Err(CoinwatchError::InvalidTimeframe {
                value: format!("0{}", unit.as_char()),
                reason: "count must be positive".into(),
            });
        }
        Ok(Self { count, unit })
    }

    pub fn hours(count: u32) -> Self {
        Self {
            count: count.max(1),
            unit: TimeframeUnit::Hour,
        }
    }

    pub fn days(count: u32) -> Self {
        Self {
            count: count.max(1),
            unit: TimeframeUnit::Day,
        }
    }

    /// Length of one bar in milliseconds. Always positive.
    pub fn duration_ms(&self) -> i64 {
        self.count as i64 * self.unit.millis()
    }
}

impl FromStr for Timeframe {
    type Err = CoinwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoinwatchError::InvalidTimeframe {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let unit_char = trimmed.chars().last().ok_or_else(|| invalid("empty"))?;
        let unit = TimeframeUnit::from_char(unit_char)
            .ok_or_else(|| invalid("unknown unit (expected m, h, d or w)"))?;

        let digits = &trimmed[..trimmed.len() - unit_char.len_utf8()];
        if !digits.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("count must be a positive integer"));
        }
        let count: u32 = digits
            .parse()
            .map_err(|_| invalid("count must be a positive integer"))?;

        Timeframe::new(count, unit).map_err(|_| invalid("count must be positive"))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.as_char())
    }
}
