//! One monitoring cycle: quotes, trends, indicator rows and alerts for every
//! tracked symbol.
//!
//! The cycle holds no timer or session state. Whoever schedules it passes the
//! current time and whether monitoring is switched on.

use crate::domain::alert::{Alert, AlertHit, evaluate_alert};
use crate::domain::analysis::{IndicatorRow, indicator_rows, latest_trend};
use crate::domain::error::CoinwatchError;
use crate::domain::fetcher::{fetch_latest_price, fetch_series};
use crate::domain::ohlcv::OhlcvSeries;
use crate::domain::timeframe::{DAY_MS, Timeframe};
use crate::domain::trend::Trend;
use crate::ports::exchange_port::ExchangePort;
use tracing::{info, warn};

/// Window of hourly bars used for the headline trend.
pub const TREND_LOOKBACK_MS: i64 = 7 * DAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monitoring {
    Enabled,
    Disabled,
}

impl From<bool> for Monitoring {
    fn from(enabled: bool) -> Self {
        if enabled {
            Monitoring::Enabled
        } else {
            Monitoring::Disabled
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub symbols: Vec<String>,
    /// Timeframe of the chart series.
    pub timeframe: Timeframe,
    pub since: Option<i64>,
    /// `None` means "up to the time of the refresh".
    pub until: Option<i64>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: Option<f64>,
    pub trend: Trend,
    pub series: OhlcvSeries,
    pub rows: Vec<IndicatorRow>,
    pub errors: Vec<CoinwatchError>,
}

impl SymbolReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct RefreshReport {
    pub generated_at: i64,
    pub symbols: Vec<SymbolReport>,
    pub alerts: Vec<AlertHit>,
}

impl RefreshReport {
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }

    pub fn failed(&self) -> usize {
        self.symbols.iter().filter(|s| !s.is_ok()).count()
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Idle,
    Report(RefreshReport),
}

pub fn refresh(
    port: &dyn ExchangePort,
    config: &RefreshConfig,
    now_ms: i64,
    monitoring: Monitoring,
) -> RefreshOutcome {
    if monitoring == Monitoring::Disabled {
        return RefreshOutcome::Idle;
    }

    let until = config.until.unwrap_or(now_ms);
    let mut symbols = Vec::with_capacity(config.symbols.len());
    let mut alerts = Vec::new();

    for symbol in &config.symbols {
        let report = refresh_symbol(port, symbol, config, until, now_ms);
        for alert in config.alerts.iter().filter(|a| &a.symbol == symbol) {
            if let Some(hit) = evaluate_alert(alert, report.price) {
                info!(symbol = %symbol, price = hit.price, threshold = hit.threshold, "alert triggered");
                alerts.push(hit);
            }
        }
        symbols.push(report);
    }

    let report = RefreshReport {
        generated_at: now_ms,
        symbols,
        alerts,
    };
    info!(
        symbols = report.symbols.len(),
        failed = report.failed(),
        alerts = report.alerts.len(),
        "refresh complete"
    );
    RefreshOutcome::Report(report)
}

fn refresh_symbol(
    port: &dyn ExchangePort,
    symbol: &str,
    config: &RefreshConfig,
    until: i64,
    now_ms: i64,
) -> SymbolReport {
    let mut errors = Vec::new();

    let price = match fetch_latest_price(port, symbol) {
        Ok(p) => Some(p),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let trend = if price.is_some() {
        match fetch_series(
            port,
            symbol,
            Timeframe::hours(1),
            Some(now_ms - TREND_LOOKBACK_MS),
            now_ms,
        ) {
            Ok(recent) => latest_trend(&recent),
            Err(e) => {
                errors.push(e);
                Trend::NoData
            }
        }
    } else {
        Trend::NoData
    };

    let series = match fetch_series(port, symbol, config.timeframe, config.since, until) {
        Ok(series) => series,
        Err(e) => {
            errors.push(e);
            OhlcvSeries::empty(symbol, config.timeframe)
        }
    };
    let rows = indicator_rows(&series);

    if !errors.is_empty() {
        warn!(symbol, errors = errors.len(), "symbol degraded to partial data");
    }

    SymbolReport {
        symbol: symbol.to_string(),
        price,
        trend,
        series,
        rows,
        errors,
    }
}
