//! Buy/Sell/Hold classification from RSI.

use std::fmt;

pub const OVERSOLD: f64 = 30.0;
pub const OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    Buy,
    Sell,
    Hold,
    /// Not enough history for an RSI value.
    NoData,
}

/// `rsi < 30` is Buy, `rsi > 70` is Sell, anything else defined is Hold.
pub fn classify_trend(rsi: Option<f64>) -> Trend {
    match rsi {
        Some(v) if v.is_nan() => Trend::NoData,
        Some(v) if v < OVERSOLD => Trend::Buy,
        Some(v) if v > OVERBOUGHT => Trend::Sell,
        Some(_) => Trend::Hold,
        None => Trend::NoData,
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Buy => "Buy",
            Trend::Sell => "Sell",
            Trend::Hold => "Hold",
            Trend::NoData => "No Data",
        };
        f.write_str(label)
    }
}
