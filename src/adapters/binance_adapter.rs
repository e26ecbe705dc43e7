//! Binance spot REST adapter.
//!
//! - klines: `GET /api/v3/klines?symbol=BTCUSDT&interval=1h&startTime=..&limit=..`
//! - ticker: `GET /api/v3/ticker/price?symbol=BTCUSDT`
//!
//! Kline rows are JSON arrays whose first six entries are open time (ms),
//! open, high, low, close and volume; prices are decimal strings.

use crate::domain::error::CoinwatchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::exchange_port::{ExchangePort, Ticker};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Largest `limit` the klines endpoint accepts.
pub const MAX_KLINES_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoinwatchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoinwatchError::ConfigInvalid {
                section: "exchange".into(),
                key: "base_url".into(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CoinwatchError> {
        let base_url = config
            .get_string("exchange", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = config.get_int("exchange", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64);
        if timeout <= 0 {
            return Err(CoinwatchError::ConfigInvalid {
                section: "exchange".into(),
                key: "timeout_secs".into(),
                reason: "timeout_secs must be positive".into(),
            });
        }
        Self::new(&base_url, Duration::from_secs(timeout as u64))
    }

    fn get(&self, symbol: &str, path: &str, query: &[(&str, String)]) -> Result<String, CoinwatchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "binance request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| CoinwatchError::fetch(symbol, e))?;
        let status = response.status();
        let body = response.text().map_err(|e| CoinwatchError::fetch(symbol, e))?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => format!("binance error {}: {}", err.code, err.msg),
                Err(_) => format!("http status {status}"),
            };
            return Err(CoinwatchError::fetch(symbol, reason));
        }
        Ok(body)
    }
}

impl ExchangePort for BinanceAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinwatchError> {
        let mut query = vec![
            ("symbol", market_id(symbol)),
            ("interval", timeframe.to_string()),
            ("limit", limit.clamp(1, MAX_KLINES_LIMIT).to_string()),
        ];
        // Without startTime the endpoint returns the most recent bars.
        query.push(("startTime", since_ms.unwrap_or(0).max(0).to_string()));

        let body = self.get(symbol, "/api/v3/klines", &query)?;
        parse_klines(&body).map_err(|reason| CoinwatchError::fetch(symbol, reason))
    }

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, CoinwatchError> {
        let body = self.get(symbol, "/api/v3/ticker/price", &[("symbol", market_id(symbol))])?;
        parse_ticker(symbol, &body).map_err(|reason| CoinwatchError::fetch(symbol, reason))
    }
}

/// `BTC/USDT` -> `BTCUSDT`.
pub fn market_id(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}

pub fn parse_klines(body: &str) -> Result<Vec<OhlcvBar>, String> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| format!("malformed klines response: {e}"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < 6 {
                return Err(format!("kline row {i} has {} fields, expected at least 6", row.len()));
            }
            let timestamp = row[0]
                .as_i64()
                .ok_or_else(|| format!("kline row {i}: open time is not an integer"))?;
            Ok(OhlcvBar {
                timestamp,
                open: decimal(&row[1], i, "open")?,
                high: decimal(&row[2], i, "high")?,
                low: decimal(&row[3], i, "low")?,
                close: decimal(&row[4], i, "close")?,
                volume: decimal(&row[5], i, "volume")?,
            })
        })
        .collect()
}

fn decimal(value: &Value, row: usize, name: &str) -> Result<f64, String> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("kline row {row}: invalid {name} {value}"))
}

pub fn parse_ticker(symbol: &str, body: &str) -> Result<Ticker, String> {
    let ticker: TickerPrice =
        serde_json::from_str(body).map_err(|e| format!("malformed ticker response: {e}"))?;
    let last = ticker
        .price
        .parse::<f64>()
        .map_err(|e| format!("invalid price for {}: {e}", ticker.symbol))?;
    Ok(Ticker {
        symbol: symbol.to_string(),
        last: Some(last),
    })
}
