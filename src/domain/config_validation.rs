//! Configuration validation.
//!
//! Every check runs before any data is loaded or any loop starts.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TrendrankError;
use crate::domain::settings::{DEFAULT_HISTORY_DAYS, DEFAULT_MIN_ADV};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

/// Checks needed by every command that reads market data.
pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    validate_data_dir(config)?;
    validate_index(config)?;
    validate_history_days(config)?;
    validate_min_adv(config)?;
    validate_symbols(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    validate_data_config(config)?;
    validate_initial_capital(config)?;
    validate_non_negative(config, "fee_bps", BacktestConfig::DEFAULT_FEE_BPS)?;
    validate_non_negative(config, "slippage_bps", BacktestConfig::DEFAULT_SLIPPAGE_BPS)?;
    validate_dates(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TrendrankError {
    TrendrankError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Value of `[section] key`, or `default` when absent. A value that is
/// present but does not parse is an error rather than the default.
fn number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TrendrankError> {
    match config.get_trimmed(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(section, key, &format!("{key} is not a number: {raw}"))),
    }
}

fn finite(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TrendrankError> {
    let value = number(config, section, key, default)?;
    if !value.is_finite() {
        return Err(invalid(section, key, &format!("{key} must be finite")));
    }
    Ok(value)
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    match config.get_trimmed("data", "dir") {
        Some(_) => Ok(()),
        None => Err(TrendrankError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_index(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    match config.get_string("data", "index") {
        Some(s) if s.trim().is_empty() => Err(invalid("data", "index", "index must not be empty")),
        _ => Ok(()),
    }
}

fn validate_history_days(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    let value = number(config, "data", "history_days", DEFAULT_HISTORY_DAYS)?;
    if value < 1 {
        return Err(invalid("data", "history_days", "history_days must be at least 1"));
    }
    Ok(())
}

fn validate_min_adv(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    let value = finite(config, "scoring", "min_adv", DEFAULT_MIN_ADV)?;
    if value < 0.0 {
        return Err(invalid("scoring", "min_adv", "min_adv must be non-negative"));
    }
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    if let Some(list) = config.get_string("universe", "symbols") {
        parse_symbols(&list).map_err(|e| invalid("universe", "symbols", &e.to_string()))?;
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    let value = finite(
        config,
        "backtest",
        "initial_capital",
        BacktestConfig::DEFAULT_INITIAL_CAPITAL,
    )?;
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_non_negative(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), TrendrankError> {
    let value = finite(config, "backtest", key, default)?;
    if value < 0.0 {
        return Err(invalid(
            "backtest",
            key,
            &format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TrendrankError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, TrendrankError> {
    match value {
        None => Err(TrendrankError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}
