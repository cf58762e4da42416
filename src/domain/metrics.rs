//! Summary performance metrics for a finished backtest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// Presentation-ready metrics. `cagr` and `max_dd` are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub cagr: f64,
    pub max_dd: f64,
    pub sharpe: f64,
    pub final_equity: f64,
    pub total_trades: usize,
}

impl Metrics {
    /// `equity_curve` must not be empty; an empty curve reports the
    /// initial capital with zeroed ratios.
    pub fn compute(
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_trades: usize,
    ) -> Self {
        let equities: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let final_equity = equities.last().copied().unwrap_or(initial_capital);

        let years = (end_date - start_date).num_days() as f64 / DAYS_PER_YEAR;

        Metrics {
            cagr: round_to(cagr(final_equity, initial_capital, years) * 100.0, 2),
            max_dd: round_to(max_drawdown(&equities) * 100.0, 2),
            sharpe: round_to(sharpe_ratio(&equities), 2),
            final_equity: round_to(final_equity, 2),
            total_trades,
        }
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Compound annual growth rate as a fraction. Zero for a non-positive span.
pub fn cagr(final_equity: f64, initial_capital: f64, years: f64) -> f64 {
    if years <= 0.0 || initial_capital <= 0.0 {
        return 0.0;
    }
    let growth = (final_equity / initial_capital).powf(1.0 / years) - 1.0;
    if growth.is_finite() { growth } else { 0.0 }
}

/// Worst peak-to-trough decline as a fraction in [-1, 0].
pub fn max_drawdown(equities: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for &equity in equities {
        peak = peak.max(equity);
        if peak > 0.0 {
            let dd = (equity - peak) / peak;
            if dd < worst {
                worst = dd;
            }
        }
    }

    worst
}

/// Annualized Sharpe ratio of daily returns (no risk-free rate) using the
/// sample standard deviation. Zero when it is undefined.
pub fn sharpe_ratio(equities: &[f64]) -> f64 {
    let returns: Vec<f64> = equities
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
