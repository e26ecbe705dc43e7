//! Market data source port trait.

use crate::domain::error::CoinwatchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::timeframe::Timeframe;

/// Current quote for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub last: Option<f64>,
}

pub trait ExchangePort {
    /// Up to `limit` bars starting at `since_ms` (or at the earliest available
    /// bar when `None`), ascending by timestamp.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, CoinwatchError>;

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, CoinwatchError>;
}
