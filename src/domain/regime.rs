//! Market regime classification from the benchmark index.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::features::EMA_SLOPE_LAG;
use super::ohlcv::IndexBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    RiskOn,
    RiskOff,
}

impl Regime {
    /// Single-condition classification of one index bar: risk-on iff
    /// close > ema50. The backtest uses this on the prior session.
    pub fn from_index_bar(bar: &IndexBar) -> Self {
        if bar.close > bar.ema50 {
            Regime::RiskOn
        } else {
            Regime::RiskOff
        }
    }

    /// Maximum number of selections for this regime.
    pub fn selection_limit(self) -> usize {
        match self {
            Regime::RiskOn => 10,
            Regime::RiskOff => 7,
        }
    }

    /// Weight applied to the risk score when computing the final score.
    pub fn risk_lambda(self) -> f64 {
        match self {
            Regime::RiskOn => 0.35,
            Regime::RiskOff => 0.55,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Regime::RiskOn => "RISK_ON",
            Regime::RiskOff => "RISK_OFF",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-condition regime test on the last bar of `index`:
/// risk-on iff close > ema50 and ema50 is above its value ten bars earlier.
/// Fewer than eleven bars is always risk-off.
pub fn detect_regime(index: &[IndexBar]) -> Regime {
    if index.len() < EMA_SLOPE_LAG + 1 {
        return Regime::RiskOff;
    }
    let current = &index[index.len() - 1];
    let lagged = &index[index.len() - 1 - EMA_SLOPE_LAG];

    if current.close > current.ema50 && current.ema50 > lagged.ema50 {
        Regime::RiskOn
    } else {
        Regime::RiskOff
    }
}
