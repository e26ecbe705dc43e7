//! Domain error types.

/// Top-level error type for coinwatch.
#[derive(Debug, thiserror::Error)]
pub enum CoinwatchError {
    #[error("invalid timeframe {value:?}: {reason}")]
    InvalidTimeframe { value: String, reason: String },

    #[error("invalid date range: since {since} is after until {until}")]
    InvalidDateRange { since: i64, until: i64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("error fetching data for {symbol}: {reason}")]
    Fetch { symbol: String, reason: String },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoinwatchError {
    pub fn fetch(symbol: &str, reason: impl std::fmt::Display) -> Self {
        CoinwatchError::Fetch {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Errors the caller has to fix before retrying the same request.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoinwatchError::InvalidTimeframe { .. }
                | CoinwatchError::InvalidDateRange { .. }
                | CoinwatchError::ConfigParse { .. }
                | CoinwatchError::ConfigMissing { .. }
                | CoinwatchError::ConfigInvalid { .. }
        )
    }
}

impl From<&CoinwatchError> for std::process::ExitCode {
    fn from(err: &CoinwatchError) -> Self {
        let code: u8 = match err {
            CoinwatchError::Io(_) => 1,
            CoinwatchError::InvalidTimeframe { .. }
            | CoinwatchError::InvalidDateRange { .. }
            | CoinwatchError::ConfigParse { .. }
            | CoinwatchError::ConfigMissing { .. }
            | CoinwatchError::ConfigInvalid { .. } => 2,
            CoinwatchError::Fetch { .. } => 3,
            CoinwatchError::Csv { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
