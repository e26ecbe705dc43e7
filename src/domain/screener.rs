//! Screener: last price, change against the previous bar and RSI for a list
//! of symbols.

use crate::domain::analysis::latest_rsi;
use crate::domain::fetcher::fetch_series;
use crate::domain::ohlcv::OhlcvSeries;
use crate::domain::timeframe::{DAY_MS, Timeframe};
use crate::ports::exchange_port::ExchangePort;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerRow {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
    pub rsi: Option<f64>,
}

/// Needs at least two bars; `None` otherwise.
pub fn screen_symbol(series: &OhlcvSeries) -> Option<ScreenerRow> {
    let n = series.len();
    if n < 2 {
        return None;
    }
    let price = series.bars[n - 1].close;
    let previous = series.bars[n - 2].close;
    let change_pct = if previous == 0.0 {
        0.0
    } else {
        (price - previous) / previous * 100.0
    };

    Some(ScreenerRow {
        symbol: series.symbol.clone(),
        price,
        change_pct,
        rsi: latest_rsi(series),
    })
}

/// Daily series over the last `lookback_days` for each symbol. Failed or
/// too-short symbols are skipped.
pub fn run_screener(
    port: &dyn ExchangePort,
    symbols: &[String],
    now_ms: i64,
    lookback_days: u32,
) -> Vec<ScreenerRow> {
    let since = now_ms - lookback_days as i64 * DAY_MS;
    let mut rows = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        match fetch_series(port, symbol, Timeframe::days(1), Some(since), now_ms) {
            Ok(series) => match screen_symbol(&series) {
                Some(row) => rows.push(row),
                None => debug!(symbol = %symbol, bars = series.len(), "not enough bars to screen"),
            },
            Err(e) => warn!(symbol = %symbol, "screener skipped: {e}"),
        }
    }
    rows
}
