//! Configuration validation.
//!
//! Validates every monitor setting before any request is made.

use crate::domain::error::CoinwatchError;
use crate::domain::symbols::{parse_symbol, parse_symbols};
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const MIN_INTERVAL_SECS: i64 = 10;
pub const MAX_INTERVAL_SECS: i64 = 300;
pub const DEFAULT_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_TIMEFRAME: &str = "1d";
pub const SOURCES: [&str; 2] = ["binance", "csv"];
pub const DEFAULT_SCREENER_LOOKBACK_DAYS: i64 = 30;

pub fn validate_monitor_config(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    validate_source(config)?;
    validate_symbols(config)?;
    validate_timeframe(config)?;
    validate_dates(config)?;
    validate_interval(config)?;
    validate_alerts(config)?;
    validate_screener(config)?;
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    let source = config
        .get_string("exchange", "source")
        .unwrap_or_else(|| "binance".to_string())
        .to_lowercase();
    if !SOURCES.contains(&source.as_str()) {
        return Err(CoinwatchError::ConfigInvalid {
            section: "exchange".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source {source:?} (expected binance or csv)"),
        });
    }
    if source == "csv" {
        match config.get_string("exchange", "data_dir") {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => {
                return Err(CoinwatchError::ConfigMissing {
                    section: "exchange".to_string(),
                    key: "data_dir".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    let raw = match config.get_string("monitor", "symbols") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(CoinwatchError::ConfigMissing {
                section: "monitor".to_string(),
                key: "symbols".to_string(),
            });
        }
    };
    parse_symbols(&raw).map_err(|e| CoinwatchError::ConfigInvalid {
        section: "monitor".to_string(),
        key: "symbols".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    if let Some(raw) = config.get_string("monitor", "timeframe") {
        raw.parse::<Timeframe>()?;
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    let start = optional_date_ms(config, "monitor", "start_date")?;
    let end = optional_date_ms(config, "monitor", "end_date")?;

    if let (Some(since), Some(until)) = (start, end) {
        if since > until {
            return Err(CoinwatchError::InvalidDateRange { since, until });
        }
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    let value = config.get_int("monitor", "interval_secs", DEFAULT_INTERVAL_SECS);
    if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&value) {
        return Err(CoinwatchError::ConfigInvalid {
            section: "monitor".to_string(),
            key: "interval_secs".to_string(),
            reason: format!(
                "interval_secs must be between {MIN_INTERVAL_SECS} and {MAX_INTERVAL_SECS}"
            ),
        });
    }
    Ok(())
}

fn validate_alerts(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    for key in config.keys("alerts") {
        parse_symbol(&key).map_err(|e| CoinwatchError::ConfigInvalid {
            section: "alerts".to_string(),
            key: key.clone(),
            reason: e.to_string(),
        })?;

        let raw = config.get_string("alerts", &key).unwrap_or_default();
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => {}
            _ => {
                return Err(CoinwatchError::ConfigInvalid {
                    section: "alerts".to_string(),
                    key,
                    reason: "alert price must be a non-negative number".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_screener(config: &dyn ConfigPort) -> Result<(), CoinwatchError> {
    if let Some(raw) = config.get_string("screener", "symbols") {
        parse_symbols(&raw).map_err(|e| CoinwatchError::ConfigInvalid {
            section: "screener".to_string(),
            key: "symbols".to_string(),
            reason: e.to_string(),
        })?;
    }
    screener_lookback_days(config)?;
    Ok(())
}

/// `[screener] lookback_days`, between 2 and `u32::MAX`.
pub fn screener_lookback_days(config: &dyn ConfigPort) -> Result<u32, CoinwatchError> {
    let days = config.get_int("screener", "lookback_days", DEFAULT_SCREENER_LOOKBACK_DAYS);
    match u32::try_from(days) {
        Ok(days) if days >= 2 => Ok(days),
        _ => Err(CoinwatchError::ConfigInvalid {
            section: "screener".to_string(),
            key: "lookback_days".to_string(),
            reason: format!("lookback_days must be between 2 and {}, got {days}", u32::MAX),
        }),
    }
}

/// `YYYY-MM-DD` as epoch milliseconds at midnight UTC.
pub fn parse_date_ms(value: &str, section: &str, key: &str) -> Result<i64, CoinwatchError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CoinwatchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("invalid {key} format, expected YYYY-MM-DD"),
        }
    })?;
    Ok(date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default())
}

pub fn optional_date_ms(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, CoinwatchError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => parse_date_ms(&s, section, key).map(Some),
        _ => Ok(None),
    }
}
