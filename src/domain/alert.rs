//! Price threshold alerts.
//!
//! Alerts are stateless: each refresh re-evaluates them against the latest
//! price and they fire on every refresh while the condition holds.

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertHit {
    pub symbol: String,
    pub threshold: f64,
    pub price: f64,
}

impl Alert {
    pub fn new(symbol: impl Into<String>, threshold: f64) -> Self {
        Self {
            symbol: symbol.into(),
            threshold,
        }
    }
}

/// Fires when the price is known and has reached or exceeded the threshold.
pub fn evaluate_alert(alert: &Alert, price: Option<f64>) -> Option<AlertHit> {
    let price = price?;
    (price >= alert.threshold).then(|| AlertHit {
        symbol: alert.symbol.clone(),
        threshold: alert.threshold,
        price,
    })
}

impl std::fmt::Display for AlertHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} has reached or exceeded your alert price of ${:.2} (now ${:.2})",
            self.symbol, self.threshold, self.price
        )
    }
}
