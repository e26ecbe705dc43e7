//! Per-bar indicator rows derived from a series.

use crate::domain::indicator::{IndicatorType, RSI_PERIOD};
use crate::domain::ohlcv::OhlcvSeries;
use crate::domain::trend::{Trend, classify_trend};

pub const FAST_SMA: IndicatorType = IndicatorType::Sma(10);
pub const SLOW_SMA: IndicatorType = IndicatorType::Sma(20);
pub const TREND_RSI: IndicatorType = IndicatorType::Rsi(RSI_PERIOD);

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub timestamp: i64,
    pub close: f64,
    pub sma_10: Option<f64>,
    pub sma_20: Option<f64>,
    pub rsi_14: Option<f64>,
    pub trend: Trend,
}

pub fn indicator_rows(series: &OhlcvSeries) -> Vec<IndicatorRow> {
    let closes = series.closes();
    let sma_10 = FAST_SMA.compute(&closes);
    let sma_20 = SLOW_SMA.compute(&closes);
    let rsi_14 = TREND_RSI.compute(&closes);

    series
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            timestamp: bar.timestamp,
            close: bar.close,
            sma_10: sma_10[i],
            sma_20: sma_20[i],
            rsi_14: rsi_14[i],
            trend: classify_trend(rsi_14[i]),
        })
        .collect()
}

/// RSI(14) of the last bar, if defined.
pub fn latest_rsi(series: &OhlcvSeries) -> Option<f64> {
    TREND_RSI.compute(&series.closes()).last().copied().flatten()
}

pub fn latest_trend(series: &OhlcvSeries) -> Trend {
    classify_trend(latest_rsi(series))
}
