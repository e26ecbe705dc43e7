//! Paginated OHLCV acquisition.
//!
//! Exchanges cap the number of bars returned per request, so a date range is
//! walked page by page: each page starts one timeframe after the last bar of
//! the previous one. The walk stops on an empty page, a short page, or once
//! the cursor reaches `until`. The accumulated bars are then deduplicated,
//! clipped to `[since, until]` and sorted.
//!
//! Any port error aborts the walk and discards the pages already received.

use crate::domain::error::CoinwatchError;
use crate::domain::ohlcv::{OhlcvBar, OhlcvSeries};
use crate::domain::timeframe::Timeframe;
use crate::ports::exchange_port::ExchangePort;
use tracing::{debug, info, warn};

/// Bars requested per page.
pub const PAGE_SIZE: usize = 1000;

pub fn fetch_series(
    port: &dyn ExchangePort,
    symbol: &str,
    timeframe: Timeframe,
    since: Option<i64>,
    until: i64,
) -> Result<OhlcvSeries, CoinwatchError> {
    if let Some(since) = since {
        if since > until {
            return Err(CoinwatchError::InvalidDateRange { since, until });
        }
    }

    let step = timeframe.duration_ms();
    let mut cursor = since;
    let mut collected: Vec<OhlcvBar> = Vec::new();
    let mut pages = 0usize;

    loop {
        debug!(symbol, %timeframe, ?cursor, page = pages + 1, "requesting ohlcv page");
        let page = port
            .fetch_ohlcv(symbol, timeframe, cursor, PAGE_SIZE)
            .map_err(|e| {
                let err = as_fetch_error(symbol, e);
                warn!(symbol, pages, "{err}");
                err
            })?;
        pages += 1;

        let Some(last) = page.last() else {
            break;
        };
        let next = last.timestamp.checked_add(step);
        let short = page.len() < PAGE_SIZE;
        collected.extend(page);

        // `None` also covers a cursor that would overflow past `i64::MAX`.
        let Some(next) = next.filter(|&n| !short && n < until) else {
            break;
        };
        // A source that keeps answering behind the cursor would never finish.
        if cursor.is_some_and(|c| next <= c) {
            warn!(symbol, next, "ohlcv cursor did not advance, stopping");
            break;
        }
        cursor = Some(next);
    }

    let bars = normalize_bars(collected, since, until);
    info!(symbol, %timeframe, pages, bars = bars.len(), "fetched ohlcv series");
    Ok(OhlcvSeries::new(symbol, timeframe, bars))
}

/// Keep the first bar seen for each timestamp, drop bars outside
/// `[since, until]`, and sort ascending.
pub fn normalize_bars(mut bars: Vec<OhlcvBar>, since: Option<i64>, until: i64) -> Vec<OhlcvBar> {
    bars.retain(|b| since.is_none_or(|s| b.timestamp >= s) && b.timestamp <= until);
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}

pub fn fetch_latest_price(port: &dyn ExchangePort, symbol: &str) -> Result<f64, CoinwatchError> {
    let ticker = port.fetch_ticker(symbol).map_err(|e| {
        let err = as_fetch_error(symbol, e);
        warn!(symbol, "{err}");
        err
    })?;

    match ticker.last {
        Some(price) if price.is_finite() => Ok(price),
        _ => {
            let err = CoinwatchError::fetch(symbol, "ticker has no last price");
            warn!(symbol, "{err}");
            Err(err)
        }
    }
}

fn as_fetch_error(symbol: &str, err: CoinwatchError) -> CoinwatchError {
    match err {
        CoinwatchError::Fetch { .. } => err,
        other => CoinwatchError::fetch(symbol, other),
    }
}
