//! CLI definition and dispatch.

use chrono::{NaiveDate, TimeDelta};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestInputs, BacktestResult, run_backtest};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::TrendrankError;
use crate::domain::history::{IndexHistory, PriceHistory, SymbolHistory};
use crate::domain::pipeline::{
    DailySignals, build_signal_history, compute_daily_signals, compute_feature_tables,
};
use crate::domain::settings::{Settings, build_backtest_config, build_settings};
use crate::domain::universe::{SymbolInfo, active_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Environment variable that overrides `[log] level`.
pub const LOG_ENV: &str = "TRENDRANK_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_OUTPUT_DIR: &str = "trendrank-report";

#[derive(Parser, Debug)]
#[command(
    name = "trendrank",
    about = "Daily equity ranking and weekly rotation backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute regime, scores and the top list for one date
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        /// Signal date (YYYY-MM-DD); defaults to the last index date
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Print the full signal set as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Run a backtest and write CSV reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the active symbol universe
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Signals { config, date, json } => run_signals(&config, date, json),
        Command::Backtest { config, output } => run_backtest_command(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TrendrankError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Installs the stderr tracing subscriber. `TRENDRANK_LOG` wins over
/// `[log] level`. A second call is a no-op.
pub fn init_logging(config: &dyn ConfigPort) {
    let level = config
        .get_trimmed("log", "level")
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(err: &TrendrankError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, TrendrankError> {
    config
        .get_trimmed("data", "dir")
        .map(|dir| CsvAdapter::new(PathBuf::from(dir)))
        .ok_or_else(|| TrendrankError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })
}

/// First date of the feature warm-up window ahead of `start`.
pub fn warmup_start(start: NaiveDate, history_days: i64) -> NaiveDate {
    TimeDelta::try_days(history_days)
        .and_then(|delta| start.checked_sub_signed(delta))
        .unwrap_or(NaiveDate::MIN)
}

/// Universe, prices and index needed to produce signals for
/// `start..=end`, including the warm-up window.
pub struct MarketData {
    pub universe: Vec<SymbolInfo>,
    pub prices: PriceHistory,
    pub index: IndexHistory,
}

pub fn load_market_data(
    data_port: &dyn DataPort,
    settings: &Settings,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MarketData, TrendrankError> {
    let from = warmup_start(start, settings.history_days);

    let index = IndexHistory::new(data_port.fetch_index(&settings.index_name, from, end)?);
    if index.bars().is_empty() {
        return Err(TrendrankError::NoData {
            what: format!("index {} between {} and {}", settings.index_name, from, end),
        });
    }

    let listed = data_port.list_symbols()?;
    let universe = active_universe(&listed, settings.symbols.as_deref());
    if universe.is_empty() {
        return Err(TrendrankError::NoData {
            what: "symbol universe".to_string(),
        });
    }

    let mut prices = PriceHistory::new();
    for info in &universe {
        let bars = match data_port.fetch_ohlcv(&info.symbol, from, end) {
            Ok(bars) => bars,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", info.symbol, e);
                continue;
            }
        };
        if bars.is_empty() {
            debug!(symbol = %info.symbol, "no price history");
            continue;
        }
        prices.insert(SymbolHistory::new(info.symbol.clone(), bars));
    }

    info!(
        symbols = universe.len(),
        with_prices = prices.len(),
        index_days = index.bars().len(),
        from = %from,
        to = %end,
        "loaded market data"
    );

    Ok(MarketData {
        universe,
        prices,
        index,
    })
}

/// Last date the index source has, used when no signal date is given.
pub fn latest_index_date(
    data_port: &dyn DataPort,
    settings: &Settings,
) -> Result<NaiveDate, TrendrankError> {
    data_port
        .fetch_index(&settings.index_name, NaiveDate::MIN, NaiveDate::MAX)?
        .last()
        .map(|bar| bar.date)
        .ok_or_else(|| TrendrankError::NoData {
            what: format!("index {}", settings.index_name),
        })
}

pub fn run_signals_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    date: Option<NaiveDate>,
) -> Result<DailySignals, TrendrankError> {
    let date = match date {
        Some(d) => d,
        None => latest_index_date(data_port, settings)?,
    };
    let market = load_market_data(data_port, settings, date, date)?;
    let features = compute_feature_tables(&market.prices, &market.index);
    Ok(compute_daily_signals(
        date,
        &market.universe,
        &features,
        &market.index,
        settings,
    ))
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
    bt_config: &BacktestConfig,
) -> Result<BacktestResult, TrendrankError> {
    let market = load_market_data(data_port, settings, bt_config.start_date, bt_config.end_date)?;
    let features = compute_feature_tables(&market.prices, &market.index);

    let timeline = market.index.timeline(bt_config.start_date, bt_config.end_date);
    eprintln!(
        "Running backtest: {} symbols, {} to {} ({} sessions)",
        market.prices.len(),
        bt_config.start_date,
        bt_config.end_date,
        timeline.len(),
    );
    let selections = build_signal_history(
        &timeline,
        &market.universe,
        &features,
        &market.index,
        settings,
    );

    let inputs = BacktestInputs {
        selections: &selections,
        features: &features,
        prices: &market.prices,
        index: &market.index,
    };
    Ok(run_backtest(bt_config, &inputs)?)
}

fn run_signals(config_path: &Path, date: Option<NaiveDate>, json: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_logging(&config);

    let settings = match build_settings(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let data_port = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let signals = match run_signals_pipeline(&data_port, &settings, date) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if json {
        match serde_json::to_string_pretty(&signals) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("error: failed to encode signals: {e}");
                return ExitCode::from(1);
            }
        }
        return ExitCode::SUCCESS;
    }

    eprintln!("Date:       {}", signals.date);
    eprintln!("Regime:     {}", signals.regime);
    eprintln!("Candidates: {}", signals.scores.len());
    if signals.features.is_empty() {
        eprintln!("No feature rows for {}", signals.date);
    }
    for entry in &signals.top {
        println!(
            "{}\t{}\t{:.2}\t{}",
            entry.rank, entry.symbol, entry.final_score, entry.universe_tag
        );
    }
    ExitCode::SUCCESS
}

fn run_backtest_command(config_path: &Path, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_logging(&config);

    let settings = match build_settings(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let bt_config = match build_backtest_config(&config, &settings) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data_port = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let result = match run_backtest_pipeline(&data_port, &settings, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_summary(&bt_config, &result);

    let output = output.unwrap_or(Path::new(DEFAULT_OUTPUT_DIR));
    let output_str = output.to_string_lossy();
    match CsvReportAdapter::new().write(&result, &output_str) {
        Ok(()) => {
            eprintln!("\nReports written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(bt_config: &BacktestConfig, result: &BacktestResult) {
    let metrics = &result.metrics;
    eprintln!("\n=== Backtest {} ===", bt_config.run_id);
    eprintln!("Initial Capital:  {:.2}", bt_config.initial_capital);
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("CAGR:             {:.2}%", metrics.cagr);
    eprintln!("Max Drawdown:     {:.2}%", metrics.max_dd);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe);
    eprintln!("Total Trades:     {}", metrics.total_trades);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match build_settings(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!("\nData:");
    eprintln!("  index:        {}", settings.index_name);
    eprintln!("  history_days: {}", settings.history_days);
    eprintln!("  min_adv:      {:.0}", settings.min_adv);
    if let Some(symbols) = &settings.symbols {
        eprintln!("  symbols:      {}", symbols.join(", "));
    }

    let has_backtest = config.get_string("backtest", "start_date").is_some()
        || config.get_string("backtest", "end_date").is_some();
    if has_backtest {
        if let Err(e) = validate_backtest_config(&config) {
            return fail(&e);
        }
        let bt_config = match build_backtest_config(&config, &settings) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };
        eprintln!("\nBacktest:");
        eprintln!("  run_id:          {}", bt_config.run_id);
        eprintln!(
            "  range:           {} to {}",
            bt_config.start_date, bt_config.end_date
        );
        eprintln!("  initial_capital: {:.2}", bt_config.initial_capital);
        eprintln!(
            "  costs:           {} bps fee, {} bps slippage",
            bt_config.fee_bps, bt_config.slippage_bps
        );
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_logging(&config);

    let settings = match build_settings(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let data_port = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let listed = match data_port.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let universe = active_universe(&listed, settings.symbols.as_deref());
    if universe.is_empty() {
        eprintln!("No active symbols found");
    } else {
        for info in &universe {
            println!("{}\t{}\t{}", info.symbol, info.sector, info.name);
        }
        eprintln!("{} symbols found", universe.len());
    }
    ExitCode::SUCCESS
}
