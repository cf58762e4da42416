//! Portfolio state carried through a backtest run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::position::Position;
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    /// Raw index close on the same date, not re-based.
    pub benchmark_equity: f64,
    pub cash: f64,
    pub holdings_count: usize,
}

/// Holdings are keyed by symbol in a sorted map so iteration order, and
/// therefore the trade log, is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub holdings: BTreeMap<String, Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            holdings: BTreeMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.holdings.insert(position.symbol.clone(), position);
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.holdings.contains_key(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        self.holdings.remove(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Value holdings with `price_of`, falling back to each position's
    /// entry price when it returns `None`.
    pub fn total_equity<F>(&self, price_of: F) -> f64
    where
        F: Fn(&str) -> Option<f64>,
    {
        let holdings_value: f64 = self
            .holdings
            .values()
            .map(|pos| pos.market_value(price_of(&pos.symbol).unwrap_or(pos.entry_price)))
            .sum();
        self.cash + holdings_value
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64, benchmark_equity: f64) {
        self.equity_curve.push(EquityPoint {
            date,
            equity,
            benchmark_equity,
            cash: self.cash,
            holdings_count: self.position_count(),
        });
    }
}
