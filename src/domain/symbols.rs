//! `BASE/QUOTE` symbol lists.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("symbol {0:?} is not in BASE/QUOTE form")]
    Malformed(String),

    #[error("duplicate symbol: {0}")]
    Duplicate(String),
}

/// Upper-cases and checks one symbol.
pub fn parse_symbol(input: &str) -> Result<String, SymbolError> {
    let symbol = input.trim().to_uppercase();
    let mut parts = symbol.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(quote), None)
            if is_asset(base) && is_asset(quote) =>
        {
            Ok(symbol)
        }
        _ => Err(SymbolError::Malformed(input.trim().to_string())),
    }
}

fn is_asset(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Comma separated list; order preserved, duplicates rejected.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        if token.trim().is_empty() {
            return Err(SymbolError::EmptyToken);
        }
        let symbol = parse_symbol(token)?;
        if !seen.insert(symbol.clone()) {
            return Err(SymbolError::Duplicate(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// `BTC/USDT` -> `BTC_USDT`, safe for file names.
pub fn file_stem(symbol: &str) -> String {
    symbol.replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_uppercases() {
        assert_eq!(
            parse_symbols("btc/usdt, ETH/USDT").unwrap(),
            vec!["BTC/USDT", "ETH/USDT"]
        );
    }

    #[test]
    fn rejects_empty_token() {
        assert_eq!(parse_symbols("BTC/USDT,,ETH/USDT"), Err(SymbolError::EmptyToken));
        assert_eq!(parse_symbols(""), Err(SymbolError::EmptyToken));
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            parse_symbols("BTC/USDT,btc/usdt"),
            Err(SymbolError::Duplicate("BTC/USDT".into()))
        );
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["BTCUSDT", "BTC/", "/USDT", "BTC/USDT/X", "BT C/USDT"] {
            assert!(
                matches!(parse_symbol(bad), Err(SymbolError::Malformed(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn file_stem_replaces_slash() {
        assert_eq!(file_stem("DOGE/USDT"), "DOGE_USDT");
    }
}
