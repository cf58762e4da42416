//! Day-by-day rotation backtest.
//!
//! Replays the index timeline between the configured dates. Mondays are
//! rebalance days: the prior session's persisted top list defines the
//! target set, each target gets 10% of current equity, and holdings that
//! dropped out are sold at the open. Stops are checked every day against
//! the prior session. Everything executes at today's open and is marked at
//! today's close.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, info_span};

use super::error::BacktestError;
use super::execution::{
    BuyOrder, BuyOutcome, ExecutionConfig, buy_position, initial_stop, sell_position,
};
use super::history::{FeatureHistory, IndexHistory, PriceHistory, SelectionHistory};
use super::metrics::Metrics;
use super::portfolio::{EquityPoint, Portfolio};
use super::regime::Regime;
use super::trade::{Trade, TradeReason};

/// Fraction of current equity allotted to each target symbol.
pub const TARGET_WEIGHT: f64 = 0.10;
pub const REBALANCE_WEEKDAY: Weekday = Weekday::Mon;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub run_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub fee_bps: f64,
    pub slippage_bps: f64,
}

impl BacktestConfig {
    pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
    pub const DEFAULT_FEE_BPS: f64 = 10.0;
    pub const DEFAULT_SLIPPAGE_BPS: f64 = 8.0;

    /// Config with default capital and costs for the given date range.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        BacktestConfig {
            run_id: format!("run-{start_date}-{end_date}"),
            start_date,
            end_date,
            initial_capital: Self::DEFAULT_INITIAL_CAPITAL,
            fee_bps: Self::DEFAULT_FEE_BPS,
            slippage_bps: Self::DEFAULT_SLIPPAGE_BPS,
        }
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            fee_bps: self.fee_bps,
            slippage_bps: self.slippage_bps,
        }
    }
}

/// Pre-computed histories a run reads from. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct BacktestInputs<'a> {
    pub selections: &'a SelectionHistory,
    pub features: &'a FeatureHistory,
    pub prices: &'a PriceHistory,
    pub index: &'a IndexHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub metrics: Metrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

pub fn is_rebalance_day(date: NaiveDate) -> bool {
    date.weekday() == REBALANCE_WEEKDAY
}

/// Target symbols for a rebalance decided on `signal_date`: the first
/// 10 (risk-on) or 7 (risk-off) entries of that day's top list, with the
/// regime taken from the single `close > ema50` test on the index bar.
pub fn target_symbols(inputs: &BacktestInputs<'_>, signal_date: NaiveDate) -> Vec<String> {
    let regime = inputs
        .index
        .get(signal_date)
        .map(Regime::from_index_bar)
        .unwrap_or(Regime::RiskOff);

    inputs
        .selections
        .get(signal_date)
        .map(|entries| {
            entries
                .iter()
                .take(regime.selection_limit())
                .map(|e| e.symbol.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Exit rules for every holding, judged on `prior` session data. Holdings
/// without a prior price row are not evaluated.
fn evaluate_stops(
    portfolio: &Portfolio,
    inputs: &BacktestInputs<'_>,
    prior: NaiveDate,
    today: NaiveDate,
) -> BTreeMap<String, TradeReason> {
    portfolio
        .holdings
        .values()
        .filter_map(|pos| {
            let bar = inputs.prices.get_bar(&pos.symbol, prior)?;
            let ema50 = inputs.features.get(&pos.symbol, prior).map(|f| f.ema50);
            let reason = pos.stop_reason(bar.close, ema50, today)?;
            Some((pos.symbol.clone(), reason))
        })
        .collect()
}

fn tradable_open(inputs: &BacktestInputs<'_>, symbol: &str, date: NaiveDate) -> Option<f64> {
    inputs
        .prices
        .get_bar(symbol, date)
        .map(|bar| bar.open)
        .filter(|open| open.is_finite() && *open > 0.0)
}

pub fn run_backtest(
    config: &BacktestConfig,
    inputs: &BacktestInputs<'_>,
) -> Result<BacktestResult, BacktestError> {
    if inputs.prices.is_empty() {
        return Err(BacktestError::NoPriceData);
    }

    let timeline = inputs.index.timeline(config.start_date, config.end_date);
    if timeline.is_empty() {
        return Err(BacktestError::EmptyTimeline {
            start: config.start_date,
            end: config.end_date,
        });
    }

    let span = info_span!("backtest", run_id = %config.run_id);
    let _guard = span.enter();
    info!(
        days = timeline.len(),
        start = %config.start_date,
        end = %config.end_date,
        "starting backtest"
    );

    let execution = config.execution();
    let mut portfolio = Portfolio::new(config.initial_capital);

    for (i, &today) in timeline.iter().enumerate() {
        let prior = i.checked_sub(1).map(|j| timeline[j]);
        let rebalance = is_rebalance_day(today);

        let targets = match prior {
            Some(signal_date) if rebalance => target_symbols(inputs, signal_date),
            _ => Vec::new(),
        };
        if rebalance {
            debug!(date = %today, targets = targets.len(), "rebalance day");
        }

        let stops = match prior {
            Some(prior) => evaluate_stops(&portfolio, inputs, prior, today),
            None => BTreeMap::new(),
        };

        let mut to_sell: BTreeSet<String> = stops.keys().cloned().collect();
        if rebalance {
            to_sell.extend(
                portfolio
                    .holdings
                    .keys()
                    .filter(|symbol| !targets.contains(symbol))
                    .cloned(),
            );
        }

        for symbol in &to_sell {
            let Some(open) = tradable_open(inputs, symbol, today) else {
                debug!(date = %today, %symbol, "no tradable price, sell deferred");
                continue;
            };
            let reason = stops.get(symbol).copied().unwrap_or(TradeReason::Rebalance);
            if let Some(trade) = sell_position(
                &mut portfolio,
                &config.run_id,
                symbol,
                open,
                today,
                reason,
                &execution,
            ) {
                debug!(date = %today, %symbol, qty = trade.qty, %reason, "sell");
            }
        }

        if let Some(signal_date) = prior.filter(|_| rebalance && !targets.is_empty()) {
            let equity_at_open = portfolio.cash
                + portfolio
                    .holdings
                    .values()
                    .filter_map(|pos| {
                        tradable_open(inputs, &pos.symbol, today).map(|o| pos.market_value(o))
                    })
                    .sum::<f64>();
            let target_notional = equity_at_open * TARGET_WEIGHT;

            for symbol in &targets {
                if portfolio.has_position(symbol) || stops.contains_key(symbol) {
                    continue;
                }
                let (Some(open), Some(signal_features), Some(signal_bar)) = (
                    tradable_open(inputs, symbol, today),
                    inputs.features.get(symbol, signal_date),
                    inputs.prices.get_bar(symbol, signal_date),
                ) else {
                    continue;
                };

                let order = BuyOrder {
                    run_id: &config.run_id,
                    symbol,
                    date: today,
                    open,
                    target_notional,
                    stop_price: initial_stop(open, signal_features.atr14, signal_bar.close),
                };
                match buy_position(&mut portfolio, &order, &execution) {
                    BuyOutcome::Filled(trade) => {
                        debug!(date = %today, %symbol, qty = trade.qty, price = trade.price, "buy");
                    }
                    outcome => {
                        debug!(date = %today, %symbol, ?outcome, "buy skipped");
                    }
                }
            }
        }

        let equity = portfolio.total_equity(|symbol| {
            inputs
                .prices
                .get_bar(symbol, today)
                .map(|bar| bar.close)
                .filter(|close| close.is_finite())
        });
        let benchmark = inputs.index.get(today).map(|bar| bar.close).unwrap_or(0.0);
        portfolio.record_equity(today, equity, benchmark);
    }

    if portfolio.equity_curve.is_empty() {
        return Err(BacktestError::EmptyEquityCurve);
    }

    let metrics = Metrics::compute(
        &portfolio.equity_curve,
        config.initial_capital,
        config.start_date,
        config.end_date,
        portfolio.trades.len(),
    );
    info!(
        final_equity = metrics.final_equity,
        cagr = metrics.cagr,
        trades = metrics.total_trades,
        "backtest finished"
    );

    Ok(BacktestResult {
        metrics,
        equity_curve: portfolio.equity_curve,
        trades: portfolio.trades,
    })
}
