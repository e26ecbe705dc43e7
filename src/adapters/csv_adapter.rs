//! CSV export of OHLCV series, and an offline exchange backed by a directory
//! of exported files.
//!
//! Files are named `BASE_QUOTE_<timeframe>.csv` (e.g. `BTC_USDT_1h.csv`) and
//! use the export layout: `Timestamp,Open,High,Low,Close,Volume`. Timestamps
//! are written as `YYYY-MM-DD HH:MM:SS` (UTC), with a `.mmm` suffix when the
//! bar is not on a whole second. They are read in that form, as RFC 3339, or
//! as epoch milliseconds.

use crate::domain::error::CoinwatchError;
use crate::domain::ohlcv::{OhlcvBar, OhlcvSeries};
use crate::domain::symbols::file_stem;
use crate::domain::timeframe::Timeframe;
use crate::ports::exchange_port::{ExchangePort, Ticker};
use chrono::{DateTime, NaiveDateTime};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

pub const CSV_HEADER: [&str; 6] = ["Timestamp", "Open", "High", "Low", "Close", "Volume"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Used instead of `TIMESTAMP_FORMAT` for bars not aligned to a whole second.
const TIMESTAMP_FORMAT_MS: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Download name used by the export command: `BTC/USDT` -> `BTC_USDT_data.csv`.
pub fn export_file_name(symbol: &str) -> String {
    format!("{}_data.csv", file_stem(symbol))
}

pub fn write_series_csv<W: Write>(series: &OhlcvSeries, writer: W) -> Result<(), CoinwatchError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER).map_err(csv_error)?;

    for bar in &series.bars {
        let timestamp = match bar.datetime() {
            Some(dt) if bar.timestamp.rem_euclid(1000) != 0 => {
                dt.format(TIMESTAMP_FORMAT_MS).to_string()
            }
            Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
            None => bar.timestamp.to_string(),
        };
        wtr.write_record([
            timestamp,
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn series_to_csv_string(series: &OhlcvSeries) -> Result<String, CoinwatchError> {
    let mut buf = Vec::new();
    write_series_csv(series, &mut buf)?;
    String::from_utf8(buf).map_err(|e| CoinwatchError::Csv {
        reason: e.to_string(),
    })
}

/// Parse bars in the export layout. Rows come back in file order.
pub fn read_bars(content: &str) -> Result<Vec<OhlcvBar>, CoinwatchError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(csv_error)?;

        let timestamp = parse_timestamp(field(&record, 0, "timestamp")?)?;
        bars.push(OhlcvBar {
            timestamp,
            open: parse_number(field(&record, 1, "open")?, "open")?,
            high: parse_number(field(&record, 2, "high")?, "high")?,
            low: parse_number(field(&record, 3, "low")?, "low")?,
            close: parse_number(field(&record, 4, "close")?, "close")?,
            volume: parse_number(field(&record, 5, "volume")?, "volume")?,
        });
    }

    Ok(bars)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, CoinwatchError> {
    record.get(index).ok_or_else(|| CoinwatchError::Csv {
        reason: format!("missing {name} column"),
    })
}

fn parse_number(value: &str, name: &str) -> Result<f64, CoinwatchError> {
    value.trim().parse().map_err(|e| CoinwatchError::Csv {
        reason: format!("invalid {name} value {value:?}: {e}"),
    })
}

fn parse_timestamp(value: &str) -> Result<i64, CoinwatchError> {
    let value = value.trim();
    if let Ok(ms) = value.parse::<i64>() {
        return Ok(ms);
    }
    for format in [TIMESTAMP_FORMAT, TIMESTAMP_FORMAT_MS] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|_| CoinwatchError::Csv {
            reason: format!("invalid timestamp {value:?}"),
        })
}

fn csv_error(e: csv::Error) -> CoinwatchError {
    CoinwatchError::Csv {
        reason: e.to_string(),
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", file_stem(symbol), timeframe))
    }

    fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<OhlcvBar>, CoinwatchError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| {
            CoinwatchError::fetch(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut bars = read_bars(&content).map_err(|e| CoinwatchError::fetch(symbol, e))?;
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    /// Timeframes with a file for `symbol`, finest first.
    pub fn available_timeframes(&self, symbol: &str) -> Result<Vec<Timeframe>, CoinwatchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            CoinwatchError::fetch(
                symbol,
                format!("failed to read directory {}: {}", self.base_path.display(), e),
            )
        })?;

        let prefix = format!("{}_", file_stem(symbol));
        let mut timeframes = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(rest) = name_str.strip_prefix(&prefix) {
                if let Some(tf) = rest.strip_suffix(".csv") {
                    if let Ok(tf) = tf.parse::<Timeframe>() {
                        timeframes.push(tf);
                    }
                }
            }
        }

        timeframes.sort_by_key(|tf| tf.duration_ms());
        Ok(timeframes)
    }
}

impl ExchangePort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinwatchError> {
        let bars = self.load(symbol, timeframe)?;
        let page: Vec<OhlcvBar> = bars
            .into_iter()
            .filter(|b| since_ms.is_none_or(|s| b.timestamp >= s))
            .take(limit)
            .collect();
        debug!(symbol, %timeframe, bars = page.len(), "served csv page");
        Ok(page)
    }

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, CoinwatchError> {
        let finest = self
            .available_timeframes(symbol)?
            .into_iter()
            .next()
            .ok_or_else(|| CoinwatchError::fetch(symbol, "no csv data"))?;
        let bars = self.load(symbol, finest)?;
        Ok(Ticker {
            symbol: symbol.to_string(),
            last: bars.last().map(|b| b.close),
        })
    }
}
