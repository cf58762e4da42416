//! Order fills at the open with basis-point slippage and fees.
//!
//! Buys are sized against a target notional, capped by available cash and
//! rounded down to whole shares. Sells always close the whole position.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::Position;
use super::trade::{Trade, TradeAction, TradeReason};

/// Orders below this notional are not placed.
pub const MIN_TRADE_NOTIONAL: f64 = 100.0;
/// Cash below this fraction of the target means "spend what is left".
pub const CASH_SHORTFALL_RATIO: f64 = 0.9;
pub const ATR_STOP_MULTIPLE: f64 = 2.0;
/// Stand-in ATR, as a fraction of the prior close, when none was computed.
pub const FALLBACK_ATR_PCT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub fee_bps: f64,
    pub slippage_bps: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            fee_bps: 10.0,
            slippage_bps: 8.0,
        }
    }
}

impl ExecutionConfig {
    pub fn fee_rate(&self) -> f64 {
        self.fee_bps / 10_000.0
    }

    pub fn slippage_rate(&self) -> f64 {
        self.slippage_bps / 10_000.0
    }
}

pub fn calculate_fee(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.fee_rate()
}

/// Buy fill: open * (1 + slippage)
pub fn apply_slippage_buy(open: f64, config: &ExecutionConfig) -> f64 {
    open * (1.0 + config.slippage_rate())
}

/// Sell fill: open * (1 - slippage)
pub fn apply_slippage_sell(open: f64, config: &ExecutionConfig) -> f64 {
    open * (1.0 - config.slippage_rate())
}

/// Protective stop fixed at entry: open - 2 * ATR of the signal day.
pub fn initial_stop(open: f64, prior_atr: Option<f64>, prior_close: f64) -> f64 {
    let atr = prior_atr
        .filter(|a| a.is_finite())
        .unwrap_or(prior_close * FALLBACK_ATR_PCT);
    open - ATR_STOP_MULTIPLE * atr
}

/// Close `symbol` at `open`. Returns `None` when it is not held.
pub fn sell_position(
    portfolio: &mut Portfolio,
    run_id: &str,
    symbol: &str,
    open: f64,
    date: NaiveDate,
    reason: TradeReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    let position = portfolio.remove_position(symbol)?;

    let exec_price = apply_slippage_sell(open, config);
    let gross_proceeds = position.qty as f64 * exec_price;
    let fee = calculate_fee(gross_proceeds, config);
    portfolio.cash += gross_proceeds - fee;

    let trade = Trade {
        run_id: run_id.to_string(),
        date,
        symbol: position.symbol,
        action: TradeAction::Sell,
        qty: position.qty,
        price: exec_price,
        fee,
        slippage: open - exec_price,
        reason,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}

/// Whole shares `amount` buys at `unit_cost`, or `None` when that is not
/// a positive count an `i64` can hold.
fn whole_shares(amount: f64, unit_cost: f64) -> Option<i64> {
    let shares = (amount / unit_cost).floor();
    if !shares.is_finite() || shares < 1.0 || shares >= i64::MAX as f64 {
        return None;
    }
    Some(shares as i64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuyOrder<'a> {
    pub run_id: &'a str,
    pub symbol: &'a str,
    pub date: NaiveDate,
    pub open: f64,
    pub target_notional: f64,
    pub stop_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuyOutcome {
    Filled(Trade),
    BelowMinimum,
    InsufficientCash,
}

/// Open a position for `order`.
///
/// 1. Spend the target notional, or the remaining cash when cash is well
///    short of it.
/// 2. Skip notionals under the minimum trade size.
/// 3. Round down to whole shares at the slipped price.
/// 4. If shares plus fee overdraw cash, shrink the quantity to fit and
///    recompute the fee.
pub fn buy_position(
    portfolio: &mut Portfolio,
    order: &BuyOrder<'_>,
    config: &ExecutionConfig,
) -> BuyOutcome {
    let cost_basis = apply_slippage_buy(order.open, config);
    if !cost_basis.is_finite() || cost_basis <= 0.0 {
        return BuyOutcome::InsufficientCash;
    }

    let amount = if portfolio.cash < order.target_notional * CASH_SHORTFALL_RATIO {
        order.target_notional.min(portfolio.cash)
    } else {
        order.target_notional
    };
    if amount < MIN_TRADE_NOTIONAL {
        return BuyOutcome::BelowMinimum;
    }

    let Some(mut qty) = whole_shares(amount, cost_basis) else {
        return BuyOutcome::InsufficientCash;
    };

    let mut gross_cost = qty as f64 * cost_basis;
    let mut fee = calculate_fee(gross_cost, config);
    if gross_cost + fee > portfolio.cash {
        qty = match whole_shares(portfolio.cash, cost_basis * (1.0 + config.fee_rate())) {
            Some(q) => q,
            None => return BuyOutcome::InsufficientCash,
        };
        gross_cost = qty as f64 * cost_basis;
        fee = calculate_fee(gross_cost, config);
    }

    portfolio.cash -= gross_cost + fee;
    portfolio.add_position(Position {
        symbol: order.symbol.to_string(),
        qty,
        entry_price: order.open,
        entry_date: order.date,
        stop_price: order.stop_price,
    });

    let trade = Trade {
        run_id: order.run_id.to_string(),
        date: order.date,
        symbol: order.symbol.to_string(),
        action: TradeAction::Buy,
        qty,
        price: cost_basis,
        fee,
        slippage: order.open * config.slippage_rate(),
        reason: TradeReason::Rebalance,
    };
    portfolio.record_trade(trade.clone());
    BuyOutcome::Filled(trade)
}
