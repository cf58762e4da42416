//! Backtest report sink port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendrankError;

pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), TrendrankError>;
}
