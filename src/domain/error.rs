//! Domain error types.

use chrono::NaiveDate;

/// Absent-input conditions that stop a backtest before or after the
/// day loop. Missing prices for a single symbol/day are not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BacktestError {
    #[error("no price data supplied")]
    NoPriceData,

    #[error("no index dates between {start} and {end}")]
    EmptyTimeline { start: NaiveDate, end: NaiveDate },

    #[error("no equity curve generated")]
    EmptyEquityCurve,
}

/// Top-level error type for trendrank.
#[derive(Debug, thiserror::Error)]
pub enum TrendrankError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

    #[error("no data for {what}")]
    NoData { what: String },

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendrankError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            TrendrankError::Io(_) => 1,
            TrendrankError::ConfigParse { .. }
            | TrendrankError::ConfigMissing { .. }
            | TrendrankError::ConfigInvalid { .. } => 2,
            TrendrankError::DataSource { .. } => 3,
            TrendrankError::NoData { .. } => 5,
            TrendrankError::Backtest(_) => 6,
        }
    }
}

impl From<&TrendrankError> for std::process::ExitCode {
    fn from(err: &TrendrankError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
