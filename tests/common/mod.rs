#![allow(dead_code)]

use coinwatch::domain::error::CoinwatchError;
pub use coinwatch::domain::ohlcv::OhlcvBar;
use coinwatch::domain::timeframe::Timeframe;
use coinwatch::ports::exchange_port::{ExchangePort, Ticker};
use std::cell::RefCell;
use std::collections::HashMap;

pub const HOUR: i64 = 3_600_000;
pub const DAY: i64 = 24 * HOUR;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Ohlcv {
        symbol: String,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: usize,
    },
    Ticker {
        symbol: String,
    },
}

/// In-memory exchange. Bars are kept per (symbol, timeframe) and served in
/// timestamp order from `since`, `limit` at a time.
pub struct MockExchange {
    pub bars: HashMap<(String, Timeframe), Vec<OhlcvBar>>,
    pub prices: HashMap<String, f64>,
    pub errors: HashMap<String, String>,
    /// Fail the nth (1-based) ohlcv request for a symbol.
    pub fail_ohlcv_call: HashMap<String, usize>,
    /// Serve pages unfiltered, ignoring `since`.
    pub ignore_since: bool,
    pub calls: RefCell<Vec<Call>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            prices: HashMap::new(),
            errors: HashMap::new(),
            fail_ohlcv_call: HashMap::new(),
            ignore_since: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, timeframe: Timeframe, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert((symbol.to_string(), timeframe), bars);
        self
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn failing_on_call(mut self, symbol: &str, n: usize) -> Self {
        self.fail_ohlcv_call.insert(symbol.to_string(), n);
        self
    }

    pub fn ohlcv_calls(&self, symbol: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Ohlcv { symbol: s, .. } if s == symbol))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ExchangePort for MockExchange {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinwatchError> {
        self.calls.borrow_mut().push(Call::Ohlcv {
            symbol: symbol.to_string(),
            timeframe,
            since: since_ms,
            limit,
        });

        if let Some(reason) = self.errors.get(symbol) {
            return Err(CoinwatchError::fetch(symbol, reason));
        }
        if self.fail_ohlcv_call.get(symbol) == Some(&self.ohlcv_calls(symbol)) {
            return Err(CoinwatchError::Io(std::io::Error::other("connection reset")));
        }

        let bars = self
            .bars
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .unwrap_or_default();
        Ok(bars
            .into_iter()
            .filter(|b| self.ignore_since || since_ms.is_none_or(|s| b.timestamp >= s))
            .take(limit)
            .collect())
    }

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, CoinwatchError> {
        self.calls.borrow_mut().push(Call::Ticker {
            symbol: symbol.to_string(),
        });

        if let Some(reason) = self.errors.get(symbol) {
            return Err(CoinwatchError::fetch(symbol, reason));
        }
        Ok(Ticker {
            symbol: symbol.to_string(),
            last: self.prices.get(symbol).copied(),
        })
    }
}

pub fn make_bar(timestamp: i64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// `count` bars spaced one `step` apart from `start`, closes rising by 1.
pub fn generate_bars(start: i64, step: i64, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| make_bar(start + i as i64 * step, start_price + i as f64))
        .collect()
}

pub fn bars_from_closes(start: i64, step: i64, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + i as i64 * step, c))
        .collect()
}
