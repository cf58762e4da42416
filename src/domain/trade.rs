//! Append-only trade log records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// Why a trade happened. Stops are listed in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeReason {
    Rebalance,
    TrendStop,
    AtrStop,
    TimeStop,
}

impl TradeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl TradeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeReason::Rebalance => "REBALANCE",
            TradeReason::TrendStop => "TREND_STOP",
            TradeReason::AtrStop => "ATR_STOP",
            TradeReason::TimeStop => "TIME_STOP",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed fill. `price` includes slippage; `slippage` is the
/// per-share concession against the open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub run_id: String,
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub qty: i64,
    pub price: f64,
    pub fee: f64,
    pub slippage: f64,
    pub reason: TradeReason,
}
