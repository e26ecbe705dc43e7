//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::{CsvAdapter, export_file_name, write_series_csv};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::alert::Alert;
use crate::domain::analysis::{FAST_SMA, IndicatorRow, SLOW_SMA, TREND_RSI, indicator_rows};
use crate::domain::config_validation::{
    DEFAULT_INTERVAL_SECS, DEFAULT_TIMEFRAME, optional_date_ms, parse_date_ms,
    screener_lookback_days, validate_monitor_config,
};
use crate::domain::error::CoinwatchError;
use crate::domain::fetcher::{fetch_latest_price, fetch_series};
use crate::domain::ohlcv::OhlcvSeries;
use crate::domain::refresh::{Monitoring, RefreshConfig, RefreshOutcome, RefreshReport, refresh};
use crate::domain::screener::{ScreenerRow, run_screener};
use crate::domain::symbols::{parse_symbol, parse_symbols};
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::exchange_port::ExchangePort;

/// Screened when `[screener] symbols` is not set.
pub const DEFAULT_SCREENER_SYMBOLS: [&str; 9] = [
    "BTC/USDT", "ETH/USDT", "BNB/USDT", "ADA/USDT", "XRP/USDT", "DOGE/USDT", "SOL/USDT",
    "DOT/USDT", "LTC/USDT",
];

#[derive(Parser, Debug)]
#[command(name = "coinwatch", about = "Cryptocurrency price monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a price history and write it as CSV
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        timeframe: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the current price of a symbol
    Price {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
    /// Print SMA(10), SMA(20), RSI(14) and trend for each bar
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        timeframe: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
        /// Only print the last N rows
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Poll prices, trends and alerts on an interval
    Monitor {
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single refresh cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Print price, daily change and RSI for a list of symbols
    Screener {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Fetch {
            config,
            symbol,
            timeframe,
            since,
            until,
            output,
        } => run_fetch(
            &config,
            &symbol,
            timeframe.as_deref(),
            since.as_deref(),
            until.as_deref(),
            output.as_ref(),
        ),
        Command::Price { config, symbol } => run_price(&config, &symbol),
        Command::Indicators {
            config,
            symbol,
            timeframe,
            since,
            until,
            tail,
        } => run_indicators(
            &config,
            &symbol,
            timeframe.as_deref(),
            since.as_deref(),
            until.as_deref(),
            tail,
        ),
        Command::Monitor { config, once } => run_monitor(&config, once),
        Command::Screener { config } => run_screener_command(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = CoinwatchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// The exchange named by `[exchange] source`.
pub fn build_exchange(config: &dyn ConfigPort) -> Result<Box<dyn ExchangePort>, CoinwatchError> {
    let source = config
        .get_string("exchange", "source")
        .unwrap_or_else(|| "binance".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config.get_string("exchange", "data_dir").ok_or_else(|| {
                CoinwatchError::ConfigMissing {
                    section: "exchange".into(),
                    key: "data_dir".into(),
                }
            })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        "binance" => {
            #[cfg(feature = "binance")]
            {
                use crate::adapters::binance_adapter::BinanceAdapter;
                Ok(Box::new(BinanceAdapter::from_config(config)?))
            }

            #[cfg(not(feature = "binance"))]
            {
                Err(CoinwatchError::ConfigInvalid {
                    section: "exchange".into(),
                    key: "source".into(),
                    reason: "binance feature is required for the binance source".into(),
                })
            }
        }
        other => Err(CoinwatchError::ConfigInvalid {
            section: "exchange".into(),
            key: "source".into(),
            reason: format!("unknown source {other:?}"),
        }),
    }
}

pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, CoinwatchError> {
    let invalid = |e: crate::domain::symbols::SymbolError| CoinwatchError::ConfigInvalid {
        section: "monitor".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    };

    if let Some(s) = symbol_override {
        return Ok(vec![parse_symbol(s).map_err(invalid)?]);
    }
    match config.get_string("monitor", "symbols") {
        Some(raw) => parse_symbols(&raw).map_err(invalid),
        None => Err(CoinwatchError::ConfigMissing {
            section: "monitor".into(),
            key: "symbols".into(),
        }),
    }
}

/// Alerts from `[alerts]`; a zero price means "no alert".
pub fn build_alerts(config: &dyn ConfigPort) -> Result<Vec<Alert>, CoinwatchError> {
    let mut alerts = Vec::new();
    for key in config.keys("alerts") {
        let symbol = parse_symbol(&key).map_err(|e| CoinwatchError::ConfigInvalid {
            section: "alerts".into(),
            key: key.clone(),
            reason: e.to_string(),
        })?;
        let threshold = config.get_double("alerts", &key, 0.0);
        if threshold > 0.0 {
            alerts.push(Alert::new(symbol, threshold));
        }
    }
    Ok(alerts)
}

pub fn build_timeframe(
    timeframe_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Timeframe, CoinwatchError> {
    match timeframe_override {
        Some(tf) => tf.parse(),
        None => config
            .get_string("monitor", "timeframe")
            .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string())
            .parse(),
    }
}

/// Date range from CLI overrides, falling back to `[monitor]` dates.
pub fn build_range(
    since_override: Option<&str>,
    until_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<(Option<i64>, Option<i64>), CoinwatchError> {
    let since = match since_override {
        Some(s) => Some(parse_date_ms(s, "monitor", "start_date")?),
        None => optional_date_ms(config, "monitor", "start_date")?,
    };
    let until = match until_override {
        Some(s) => Some(parse_date_ms(s, "monitor", "end_date")?),
        None => optional_date_ms(config, "monitor", "end_date")?,
    };
    Ok((since, until))
}

pub fn build_refresh_config(config: &dyn ConfigPort) -> Result<RefreshConfig, CoinwatchError> {
    let (since, until) = build_range(None, None, config)?;
    Ok(RefreshConfig {
        symbols: resolve_symbols(None, config)?,
        timeframe: build_timeframe(None, config)?,
        since,
        until,
        alerts: build_alerts(config)?,
    })
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fetch a series and write it to `output` as CSV. Returns the bar count.
pub fn export_series(
    port: &dyn ExchangePort,
    symbol: &str,
    timeframe: Timeframe,
    since: Option<i64>,
    until: i64,
    output: &Path,
) -> Result<usize, CoinwatchError> {
    let series = fetch_series(port, symbol, timeframe, since, until)?;
    let file = File::create(output)?;
    write_series_csv(&series, BufWriter::new(file))?;
    Ok(series.len())
}

fn run_fetch(
    config_path: &PathBuf,
    symbol: &str,
    timeframe: Option<&str>,
    since: Option<&str>,
    until: Option<&str>,
    output: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = (|| {
        let symbol = resolve_symbols(Some(symbol), &config)?.remove(0);
        let timeframe = build_timeframe(timeframe, &config)?;
        let (since, until) = build_range(since, until, &config)?;
        let port = build_exchange(&config)?;
        let output = output
            .cloned()
            .unwrap_or_else(|| PathBuf::from(export_file_name(&symbol)));
        let count = export_series(
            port.as_ref(),
            &symbol,
            timeframe,
            since,
            until.unwrap_or_else(now_ms),
            &output,
        )?;
        Ok::<_, CoinwatchError>((count, output))
    })();

    match result {
        Ok((count, output)) => {
            println!("{}", output.display());
            eprintln!("{count} bars written to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_price(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = (|| {
        let symbol = resolve_symbols(Some(symbol), &config)?.remove(0);
        let port = build_exchange(&config)?;
        let price = fetch_latest_price(port.as_ref(), &symbol)?;
        Ok::<_, CoinwatchError>((symbol, price))
    })();

    match result {
        Ok((symbol, price)) => {
            println!("{symbol}: ${}", format_price(price));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_indicators(
    config_path: &PathBuf,
    symbol: &str,
    timeframe: Option<&str>,
    since: Option<&str>,
    until: Option<&str>,
    tail: Option<usize>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = (|| {
        let symbol = resolve_symbols(Some(symbol), &config)?.remove(0);
        let timeframe = build_timeframe(timeframe, &config)?;
        let (since, until) = build_range(since, until, &config)?;
        let port = build_exchange(&config)?;
        fetch_series(
            port.as_ref(),
            &symbol,
            timeframe,
            since,
            until.unwrap_or_else(now_ms),
        )
    })();

    let series = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let rows = indicator_rows(&series);
    let skip = tail.map_or(0, |n| rows.len().saturating_sub(n));
    let stdout = io::stdout();
    match render_indicator_table(&series, &rows[skip..], &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = CoinwatchError::from(e);
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

pub fn run_monitor(config_path: &PathBuf, once: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_monitor_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let (refresh_config, port) = match build_refresh_config(&config)
        .and_then(|rc| build_exchange(&config).map(|port| (rc, port)))
    {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let monitoring = Monitoring::from(config.get_bool("monitor", "enabled", true));
    let interval = Duration::from_secs(
        config.get_int("monitor", "interval_secs", DEFAULT_INTERVAL_SECS) as u64,
    );

    eprintln!(
        "Monitoring {} symbol(s) every {}s",
        refresh_config.symbols.len(),
        interval.as_secs()
    );

    loop {
        match refresh(port.as_ref(), &refresh_config, now_ms(), monitoring) {
            RefreshOutcome::Report(report) => {
                let stdout = io::stdout();
                if let Err(e) = render_report(&report, &mut stdout.lock()) {
                    let err = CoinwatchError::from(e);
                    eprintln!("error: {err}");
                    return (&err).into();
                }
            }
            RefreshOutcome::Idle => {
                println!("Monitoring is disabled. Set [monitor] enabled = true to begin fetching data.");
                return ExitCode::SUCCESS;
            }
        }

        if once {
            return ExitCode::SUCCESS;
        }
        std::thread::sleep(interval);
    }
}

fn run_screener_command(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match config.get_string("screener", "symbols") {
        Some(raw) => match parse_symbols(&raw) {
            Ok(s) => s,
            Err(e) => {
                let err = CoinwatchError::ConfigInvalid {
                    section: "screener".into(),
                    key: "symbols".into(),
                    reason: e.to_string(),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        },
        None => DEFAULT_SCREENER_SYMBOLS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };
    let lookback = match screener_lookback_days(&config) {
        Ok(days) => days,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let port = match build_exchange(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let rows = run_screener(port.as_ref(), &symbols, now_ms(), lookback);
    let stdout = io::stdout();
    match render_screener(&rows, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = CoinwatchError::from(e);
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_monitor_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let refresh_config = match build_refresh_config(&config) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nSymbols:   {}", refresh_config.symbols.join(", "));
    eprintln!("Timeframe: {}", refresh_config.timeframe);
    eprintln!(
        "Range:     {} to {}",
        refresh_config.since.map_or("earliest".to_string(), format_timestamp),
        refresh_config.until.map_or("now".to_string(), format_timestamp),
    );
    if refresh_config.alerts.is_empty() {
        eprintln!("Alerts:    none");
    } else {
        for alert in &refresh_config.alerts {
            eprintln!("Alert:     {} >= ${}", alert.symbol, format_price(alert.threshold));
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

pub fn render_report(report: &RefreshReport, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "=== Current Prices and Trends ===")?;
    for sr in &report.symbols {
        writeln!(out, "\n{}", sr.symbol)?;
        match sr.price {
            Some(price) => {
                writeln!(out, "  Current Price: ${}", format_price(price))?;
                writeln!(out, "  Trend: {}", sr.trend)?;
            }
            None => writeln!(out, "  Could not fetch current price for {}", sr.symbol)?,
        }

        match (sr.series.span(), sr.rows.last()) {
            (Some((first, last)), Some(row)) => {
                writeln!(
                    out,
                    "  {} bars ({}): {} to {}",
                    sr.series.len(),
                    sr.series.timeframe,
                    format_timestamp(first),
                    format_timestamp(last)
                )?;
                writeln!(
                    out,
                    "  {} {}  {} {}  {} {}",
                    FAST_SMA,
                    format_opt(row.sma_10),
                    SLOW_SMA,
                    format_opt(row.sma_20),
                    TREND_RSI,
                    format_opt(row.rsi_14)
                )?;
            }
            _ => writeln!(out, "  No chart data")?,
        }

        for err in &sr.errors {
            writeln!(out, "  error: {err}")?;
        }
    }

    for hit in &report.alerts {
        writeln!(out, "\nALERT: {hit}")?;
    }
    writeln!(out, "\nLast updated: {}", format_timestamp(report.generated_at))?;
    out.flush()
}

pub fn render_indicator_table(
    series: &OhlcvSeries,
    rows: &[IndicatorRow],
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(out, "{} ({})", series.symbol, series.timeframe)?;
    writeln!(
        out,
        "{:<19}  {:>14}  {:>14}  {:>14}  {:>8}  {}",
        "Timestamp",
        "Close",
        FAST_SMA.to_string(),
        SLOW_SMA.to_string(),
        TREND_RSI.to_string(),
        "Trend"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<19}  {:>14.2}  {:>14}  {:>14}  {:>8}  {}",
            format_timestamp(row.timestamp),
            row.close,
            format_opt(row.sma_10),
            format_opt(row.sma_20),
            format_opt(row.rsi_14),
            row.trend
        )?;
    }
    out.flush()
}

pub fn render_screener(rows: &[ScreenerRow], out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<12}  {:>16}  {:>14}  {:>8}",
        "Symbol", "Price", "Change (%)", "RSI"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<12}  {:>16}  {:>13.2}%  {:>8}",
            row.symbol,
            format!("${}", format_price(row.price)),
            row.change_pct,
            format_opt(row.rsi)
        )?;
    }
    out.flush()
}

/// Two decimals with thousands separators: `43125.5` -> `43,125.50`.
pub fn format_price(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

pub fn format_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
