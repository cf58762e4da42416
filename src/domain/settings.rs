//! Immutable run settings assembled from configuration.
//!
//! Entry points receive a [`Settings`] value explicitly; nothing reads
//! configuration from global state.

use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_data_config,
};
use crate::domain::error::TrendrankError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INDEX: &str = "XU100";
pub const DEFAULT_HISTORY_DAYS: i64 = 400;
pub const DEFAULT_MIN_ADV: f64 = 10_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub index_name: String,
    /// Calendar days of warm-up history loaded before the first signal date.
    pub history_days: i64,
    pub min_adv: f64,
    pub execution: ExecutionConfig,
    /// Restricts the universe when set.
    pub symbols: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            index_name: DEFAULT_INDEX.to_string(),
            history_days: DEFAULT_HISTORY_DAYS,
            min_adv: DEFAULT_MIN_ADV,
            execution: ExecutionConfig::default(),
            symbols: None,
        }
    }
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, TrendrankError> {
    validate_data_config(config)?;

    let symbols = match config.get_string("universe", "symbols") {
        Some(list) => Some(parse_symbols(&list).map_err(|e| TrendrankError::ConfigInvalid {
            section: "universe".to_string(),
            key: "symbols".to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    Ok(Settings {
        index_name: config
            .get_trimmed("data", "index")
            .unwrap_or_else(|| DEFAULT_INDEX.to_string()),
        history_days: config.get_int("data", "history_days", DEFAULT_HISTORY_DAYS),
        min_adv: config.get_double("scoring", "min_adv", DEFAULT_MIN_ADV),
        execution: ExecutionConfig {
            fee_bps: config.get_double("backtest", "fee_bps", BacktestConfig::DEFAULT_FEE_BPS),
            slippage_bps: config.get_double(
                "backtest",
                "slippage_bps",
                BacktestConfig::DEFAULT_SLIPPAGE_BPS,
            ),
        },
        symbols,
    })
}

pub fn build_backtest_config(
    config: &dyn ConfigPort,
    settings: &Settings,
) -> Result<BacktestConfig, TrendrankError> {
    validate_backtest_config(config)?;

    let start_date = parse_date(
        config.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        config.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    let mut backtest = BacktestConfig::new(start_date, end_date);
    if let Some(run_id) = config.get_trimmed("backtest", "run_id") {
        backtest.run_id = run_id;
    }
    backtest.initial_capital = config.get_double(
        "backtest",
        "initial_capital",
        BacktestConfig::DEFAULT_INITIAL_CAPITAL,
    );
    backtest.fee_bps = settings.execution.fee_bps;
    backtest.slippage_bps = settings.execution.slippage_bps;

    Ok(backtest)
}
