//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_refresh_config, build_alerts, build_range)
//! - Symbol resolution (resolve_symbols)
//! - Exchange selection (build_exchange)
//! - Offline runs against a CSV data directory
//! - Rendering of reports, indicator tables and screener rows

mod common;

use common::*;
use coinwatch::adapters::csv_adapter::{CsvAdapter, read_bars, series_to_csv_string};
use coinwatch::adapters::file_config_adapter::FileConfigAdapter;
use coinwatch::cli;
use coinwatch::domain::analysis::indicator_rows;
use coinwatch::domain::config_validation::validate_monitor_config;
use coinwatch::domain::error::CoinwatchError;
use coinwatch::domain::fetcher::{fetch_latest_price, fetch_series};
use coinwatch::domain::ohlcv::OhlcvSeries;
use coinwatch::domain::refresh::{Monitoring, RefreshOutcome, refresh};
use coinwatch::domain::screener::run_screener;
use coinwatch::domain::timeframe::Timeframe;
use std::fs;
use std::io::Write;
use std::path::Path;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config(ini: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(ini).unwrap()
}

const VALID_INI: &str = r#"
[exchange]
source = binance
timeout_secs = 5

[monitor]
enabled = true
symbols = BTC/USDT, eth/usdt, SOL/USDT
timeframe = 4h
start_date = 2024-01-01
end_date = 2024-03-01
interval_secs = 60

[alerts]
BTC/USDT = 50000
ETH/USDT = 0

[screener]
symbols = BTC/USDT,ETH/USDT
lookback_days = 30
"#;

/// Write `series` where the offline exchange expects it.
fn write_csv_series(dir: &Path, series: &OhlcvSeries) {
    let adapter = CsvAdapter::new(dir.to_path_buf());
    let path = adapter.csv_path(&series.symbol, series.timeframe);
    fs::write(path, series_to_csv_string(series).unwrap()).unwrap();
}

fn csv_ini(dir: &Path) -> String {
    format!(
        "[exchange]\nsource = csv\ndata_dir = {}\n\n[monitor]\nsymbols = BTC/USDT\ntimeframe = 1d\n",
        dir.display()
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_reads_file() {
        let file = write_temp_ini(VALID_INI);
        let cfg = cli::load_config(&file.path().to_path_buf()).unwrap();
        validate_monitor_config(&cfg).unwrap();
    }

    #[test]
    fn load_config_missing_file_is_config_error() {
        let path = std::path::PathBuf::from("/nonexistent/coinwatch.ini");
        assert!(cli::load_config(&path).is_err());
    }

    #[test]
    fn refresh_config_from_full_ini() {
        let rc = cli::build_refresh_config(&config(VALID_INI)).unwrap();

        assert_eq!(rc.symbols, vec!["BTC/USDT", "ETH/USDT", "SOL/USDT"]);
        assert_eq!(rc.timeframe, Timeframe::hours(4));
        assert_eq!(rc.since, Some(1_704_067_200_000));
        assert_eq!(rc.until, Some(1_709_251_200_000));
        assert_eq!(rc.alerts.len(), 1);
        assert_eq!(rc.alerts[0].symbol, "BTC/USDT");
        assert_eq!(rc.alerts[0].threshold, 50000.0);
    }

    #[test]
    fn minimal_ini_uses_defaults() {
        let rc = cli::build_refresh_config(&config("[monitor]\nsymbols = BTC/USDT\n")).unwrap();
        assert_eq!(rc.timeframe, Timeframe::days(1));
        assert_eq!(rc.since, None);
        assert_eq!(rc.until, None);
        assert!(rc.alerts.is_empty());
    }

    #[test]
    fn missing_symbols_is_reported() {
        let err = cli::build_refresh_config(&config("[monitor]\ntimeframe = 1h\n")).unwrap_err();
        assert!(matches!(err, CoinwatchError::ConfigMissing { ref key, .. } if key == "symbols"));
    }

    #[test]
    fn bad_timeframe_is_reported() {
        let err = cli::build_refresh_config(&config("[monitor]\nsymbols = BTC/USDT\ntimeframe = 3x\n"))
            .unwrap_err();
        assert!(matches!(err, CoinwatchError::InvalidTimeframe { .. }));
    }

    #[test]
    fn oversized_screener_lookback_is_rejected() {
        let cfg = config("[monitor]\nsymbols = BTC/USDT\n\n[screener]\nlookback_days = 4294967296\n");
        let err = validate_monitor_config(&cfg).unwrap_err();
        assert!(matches!(err, CoinwatchError::ConfigInvalid { ref key, .. } if key == "lookback_days"));
    }

    #[test]
    fn alert_key_must_be_a_symbol() {
        let err = cli::build_alerts(&config("[alerts]\nbitcoin = 100\n")).unwrap_err();
        assert!(matches!(err, CoinwatchError::ConfigInvalid { ref section, .. } if section == "alerts"));
    }
}

mod overrides {
    use super::*;

    #[test]
    fn symbol_override_wins() {
        let symbols = cli::resolve_symbols(Some("ada/usdt"), &config(VALID_INI)).unwrap();
        assert_eq!(symbols, vec!["ADA/USDT"]);
    }

    #[test]
    fn malformed_override_is_rejected() {
        assert!(cli::resolve_symbols(Some("BTCUSDT"), &config(VALID_INI)).is_err());
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let err = cli::resolve_symbols(None, &config("[monitor]\nsymbols = BTC/USDT,btc/usdt\n"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn range_overrides_replace_config_dates() {
        let (since, until) =
            cli::build_range(Some("2024-02-01"), None, &config(VALID_INI)).unwrap();
        assert_eq!(since, Some(1_706_745_600_000));
        assert_eq!(until, Some(1_709_251_200_000));
    }

    #[test]
    fn bad_date_override_is_rejected() {
        let err = cli::build_range(Some("01/02/2024"), None, &config(VALID_INI)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn timeframe_override_wins() {
        let tf = cli::build_timeframe(Some("15m"), &config(VALID_INI)).unwrap();
        assert_eq!(tf.to_string(), "15m");
    }
}

mod exchange_selection {
    use super::*;

    #[test]
    fn csv_source_needs_data_dir() {
        let err = cli::build_exchange(&config("[exchange]\nsource = csv\n")).err().unwrap();
        assert!(matches!(err, CoinwatchError::ConfigMissing { ref key, .. } if key == "data_dir"));
    }

    #[test]
    fn unknown_source_is_rejected() {
        let err = cli::build_exchange(&config("[exchange]\nsource = kraken\n")).err().unwrap();
        assert!(matches!(err, CoinwatchError::ConfigInvalid { ref key, .. } if key == "source"));
    }

    #[cfg(feature = "binance")]
    #[test]
    fn binance_is_the_default_source() {
        assert!(cli::build_exchange(&config("[monitor]\nsymbols = BTC/USDT\n")).is_ok());
    }
}

mod offline {
    use super::*;

    const NOW: i64 = 200 * DAY;

    fn seeded_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let daily = OhlcvSeries::new(
            "BTC/USDT",
            Timeframe::days(1),
            generate_bars(NOW - 39 * DAY, DAY, 40, 100.0),
        );
        let closes: Vec<f64> = (0..=168).map(|i| 100.0 + i as f64).collect();
        let hourly = OhlcvSeries::new(
            "BTC/USDT",
            Timeframe::hours(1),
            bars_from_closes(NOW - 7 * DAY, HOUR, &closes),
        );
        write_csv_series(dir.path(), &daily);
        write_csv_series(dir.path(), &hourly);
        dir
    }

    #[test]
    fn price_is_last_close_of_finest_file() {
        let dir = seeded_dir();
        let port = cli::build_exchange(&config(&csv_ini(dir.path()))).unwrap();
        let price = fetch_latest_price(port.as_ref(), "BTC/USDT").unwrap();
        assert_eq!(price, 268.0);
    }

    #[test]
    fn unknown_symbol_is_a_fetch_error() {
        let dir = seeded_dir();
        let port = cli::build_exchange(&config(&csv_ini(dir.path()))).unwrap();
        let err = fetch_latest_price(port.as_ref(), "XRP/USDT").unwrap_err();
        assert!(matches!(err, CoinwatchError::Fetch { .. }));
    }

    #[test]
    fn refresh_from_csv_directory() {
        let dir = seeded_dir();
        let cfg = config(&csv_ini(dir.path()));
        let rc = cli::build_refresh_config(&cfg).unwrap();
        let port = cli::build_exchange(&cfg).unwrap();

        let RefreshOutcome::Report(report) = refresh(port.as_ref(), &rc, NOW, Monitoring::Enabled)
        else {
            panic!("expected a report");
        };
        let btc = report.symbol("BTC/USDT").unwrap();
        assert!(btc.is_ok(), "{:?}", btc.errors);
        assert_eq!(btc.series.len(), 40);
        assert_eq!(btc.trend.to_string(), "Sell");

        let mut out = Vec::new();
        cli::render_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== Current Prices and Trends ==="));
        assert!(text.contains("Current Price: $268.00"));
        assert!(text.contains("Trend: Sell"));
        assert!(text.contains("SMA(10)"));
        assert!(text.contains("Last updated: "));
    }

    #[test]
    fn export_writes_readable_csv() {
        let dir = seeded_dir();
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("BTC_USDT_data.csv");

        let count = cli::export_series(
            &port,
            "BTC/USDT",
            Timeframe::days(1),
            Some(NOW - 9 * DAY),
            NOW,
            &output,
        )
        .unwrap();
        assert_eq!(count, 10);

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("Timestamp,Open,High,Low,Close,Volume"));
        let bars = read_bars(&content).unwrap();
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].timestamp, NOW - 9 * DAY);
        assert_eq!(bars[9].close, 139.0);
    }

    #[test]
    fn export_with_inverted_range_writes_nothing() {
        let dir = seeded_dir();
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let output = dir.path().join("out.csv");

        let err = cli::export_series(&port, "BTC/USDT", Timeframe::days(1), Some(NOW), NOW - DAY, &output)
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(!output.exists());
    }
}

mod rendering {
    use super::*;

    #[test]
    fn failed_symbol_renders_fallback_lines() {
        let port = MockExchange::new().with_error("ETH/USDT", "timeout");
        let rc = cli::build_refresh_config(&config("[monitor]\nsymbols = ETH/USDT\n")).unwrap();

        let RefreshOutcome::Report(report) = refresh(&port, &rc, 10 * DAY, Monitoring::Enabled) else {
            panic!("expected a report");
        };
        let mut out = Vec::new();
        cli::render_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Could not fetch current price for ETH/USDT"));
        assert!(text.contains("No chart data"));
        assert!(text.contains("error: error fetching data for ETH/USDT: timeout"));
    }

    #[test]
    fn alert_is_rendered() {
        let port = MockExchange::new().with_price("BTC/USDT", 51000.0);
        let rc = cli::build_refresh_config(&config(VALID_INI)).unwrap();

        let RefreshOutcome::Report(report) = refresh(&port, &rc, 1_709_251_200_000, Monitoring::Enabled)
        else {
            panic!("expected a report");
        };
        let mut out = Vec::new();
        cli::render_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ALERT: "));
        assert!(text.contains("BTC/USDT"));
    }

    #[test]
    fn indicator_table_has_header_and_rows() {
        let closes: Vec<f64> = (10..=30).map(f64::from).collect();
        let port = MockExchange::new().with_bars("BTC/USDT", Timeframe::days(1), bars_from_closes(0, DAY, &closes));
        let series = fetch_series(&port, "BTC/USDT", Timeframe::days(1), None, 100 * DAY).unwrap();
        let rows = indicator_rows(&series);

        let mut out = Vec::new();
        cli::render_indicator_table(&series, &rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "BTC/USDT (1d)");
        assert!(lines[1].contains("SMA(10)") && lines[1].contains("RSI(14)"));
        assert_eq!(lines.len(), 2 + closes.len());
        assert!(lines[2].starts_with("1970-01-01 00:00:00"));
        assert!(lines[2].ends_with("No Data"));
        assert!(lines.last().unwrap().ends_with("Sell"));
    }

    #[test]
    fn screener_table() {
        let now = 50 * DAY;
        let port = MockExchange::new().with_bars(
            "BTC/USDT",
            Timeframe::days(1),
            bars_from_closes(now - DAY, DAY, &[40000.0, 42000.0]),
        );
        let rows = run_screener(&port, &["BTC/USDT".to_string()], now, 30);

        let mut out = Vec::new();
        cli::render_screener(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().next().unwrap().starts_with("Symbol"));
        assert!(text.contains("$42,000.00"));
        assert!(text.contains("5.00%"));
    }
}
