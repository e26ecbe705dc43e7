//! Core domain types and logic.

pub mod ohlcv;
pub mod timeframe;
pub mod symbols;
pub mod fetcher;
pub mod indicator;
pub mod trend;
pub mod analysis;
pub mod alert;
pub mod screener;
pub mod refresh;
pub mod config_validation;
pub mod error;
