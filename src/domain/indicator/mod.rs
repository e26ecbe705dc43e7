//! Technical indicators over closing prices.
//!
//! Every indicator returns one `Option<f64>` per input close; `None` marks the
//! warmup positions where there is not enough look-back data.

pub mod rsi;
pub mod sma;

use std::fmt;

pub use rsi::rsi;
pub use sma::simple_moving_average;

/// Period used for the RSI shown next to prices and in the screener.
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

impl IndicatorType {
    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        match *self {
            IndicatorType::Sma(window) => simple_moving_average(closes, window),
            IndicatorType::Rsi(period) => rsi(closes, period),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(window) => write!(f, "SMA({})", window),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}
