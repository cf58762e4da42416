//! Open long positions and their exit rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade::TradeReason;

/// Calendar days after which a position is closed regardless of trend.
pub const TIME_STOP_DAYS: i64 = 56;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub qty: i64,
    /// Raw open on the entry day, before slippage.
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_price: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.qty as f64 * price
    }

    pub fn days_held(&self, today: NaiveDate) -> i64 {
        (today - self.entry_date).num_days()
    }

    /// First matching exit rule, evaluated against the prior session.
    /// The trend stop only applies when a prior EMA50 is known.
    pub fn stop_reason(
        &self,
        prior_close: f64,
        prior_ema50: Option<f64>,
        today: NaiveDate,
    ) -> Option<TradeReason> {
        if prior_ema50.is_some_and(|ema| prior_close < ema) {
            Some(TradeReason::TrendStop)
        } else if prior_close < self.stop_price {
            Some(TradeReason::AtrStop)
        } else if self.days_held(today) >= TIME_STOP_DAYS {
            Some(TradeReason::TimeStop)
        } else {
            None
        }
    }
}
