//! CSV report adapter: writes `trades.csv`, `equity.csv` and `metrics.csv`
//! for a backtest result into an output directory.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendrankError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const TRADES_FILE: &str = "trades.csv";
pub const EQUITY_FILE: &str = "equity.csv";
pub const METRICS_FILE: &str = "metrics.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), TrendrankError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_error(path: &Path, err: csv::Error) -> TrendrankError {
    TrendrankError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        err
    )))
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), TrendrankError> {
        let dir = Path::new(output_path);
        fs::create_dir_all(dir)?;

        Self::write_rows(&dir.join(TRADES_FILE), &result.trades)?;
        Self::write_rows(&dir.join(EQUITY_FILE), &result.equity_curve)?;
        Self::write_rows(&dir.join(METRICS_FILE), std::slice::from_ref(&result.metrics))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::Metrics;
    use crate::domain::portfolio::EquityPoint;
    use crate::domain::trade::{Trade, TradeAction, TradeReason};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result() -> BacktestResult {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        BacktestResult {
            metrics: Metrics {
                cagr: 12.34,
                max_dd: -5.5,
                sharpe: 1.2,
                final_equity: 112_340.0,
                total_trades: 1,
            },
            equity_curve: vec![EquityPoint {
                date,
                equity: 100_000.0,
                benchmark_equity: 8_000.0,
                cash: 90_000.0,
                holdings_count: 1,
            }],
            trades: vec![Trade {
                run_id: "r1".to_string(),
                date,
                symbol: "THYAO".to_string(),
                action: TradeAction::Buy,
                qty: 100,
                price: 100.08,
                fee: 10.008,
                slippage: 0.08,
                reason: TradeReason::Rebalance,
            }],
        }
    }

    #[test]
    fn writes_all_three_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("report");
        CsvReportAdapter::new()
            .write(&sample_result(), out.to_str().unwrap())
            .unwrap();

        let trades = fs::read_to_string(out.join(TRADES_FILE)).unwrap();
        let mut lines = trades.lines();
        assert_eq!(
            lines.next().unwrap(),
            "run_id,date,symbol,action,qty,price,fee,slippage,reason"
        );
        assert_eq!(
            lines.next().unwrap(),
            "r1,2024-01-08,THYAO,BUY,100,100.08,10.008,0.08,REBALANCE"
        );

        let equity = fs::read_to_string(out.join(EQUITY_FILE)).unwrap();
        assert!(equity.starts_with("date,equity,benchmark_equity,cash,holdings_count\n"));
        assert!(equity.contains("2024-01-08,100000.0,8000.0,90000.0,1"));

        let metrics = fs::read_to_string(out.join(METRICS_FILE)).unwrap();
        assert_eq!(
            metrics,
            "cagr,max_dd,sharpe,final_equity,total_trades\n12.34,-5.5,1.2,112340.0,1\n"
        );
    }

    #[test]
    fn empty_trade_log_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let mut result = sample_result();
        result.trades.clear();
        CsvReportAdapter::new()
            .write(&result, dir.path().to_str().unwrap())
            .unwrap();
        let trades = fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        assert!(trades.is_empty());
    }
}
