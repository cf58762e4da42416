//! Daily signal pipeline: features → normalization → scores → top list.
//!
//! Feature tables are independent per symbol and signal dates are
//! independent of each other, so both fan out across threads.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::features::{FeatureRow, compute_features};
use super::history::{FeatureHistory, IndexHistory, PriceHistory, SelectionHistory};
use super::normalize::normalize_cross_sectional;
use super::regime::{Regime, detect_regime};
use super::scoring::{ScoredCandidate, calculate_scores};
use super::selection::{TopEntry, select_top10};
use super::settings::Settings;
use super::universe::SymbolInfo;

/// Everything produced for one signal date. `features` holds the raw
/// (un-normalized) snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySignals {
    pub date: NaiveDate,
    pub regime: Regime,
    pub features: Vec<FeatureRow>,
    pub scores: Vec<ScoredCandidate>,
    pub top: Vec<TopEntry>,
}

pub fn compute_feature_tables(prices: &PriceHistory, index: &IndexHistory) -> FeatureHistory {
    let histories: Vec<_> = prices.iter().collect();
    let tables: Vec<Vec<FeatureRow>> = histories
        .par_iter()
        .map(|history| compute_features(&history.bars, index.bars()))
        .collect();

    let features: FeatureHistory = tables.into_iter().flatten().collect();
    info!(symbols = histories.len(), rows = features.len(), "computed feature tables");
    features
}

/// Signals for `date` over `universe`. Symbols without a feature row on
/// that date are left out; no rows at all yields empty signals.
pub fn compute_daily_signals(
    date: NaiveDate,
    universe: &[SymbolInfo],
    features: &FeatureHistory,
    index: &IndexHistory,
    settings: &Settings,
) -> DailySignals {
    let regime = detect_regime(index.up_to(date));

    let snapshot: Vec<FeatureRow> = universe
        .iter()
        .filter_map(|info| features.get(&info.symbol, date).cloned())
        .collect();
    let normalized = normalize_cross_sectional(&snapshot);
    let scores = calculate_scores(&normalized, regime);
    let top = select_top10(&scores, universe, settings.min_adv, regime);

    debug!(
        date = %date,
        %regime,
        candidates = snapshot.len(),
        selected = top.len(),
        "daily signals"
    );

    DailySignals {
        date,
        regime,
        features: snapshot,
        scores,
        top,
    }
}

/// Top lists for every date in `dates`, as consumed by the backtest.
pub fn build_signal_history(
    dates: &[NaiveDate],
    universe: &[SymbolInfo],
    features: &FeatureHistory,
    index: &IndexHistory,
    settings: &Settings,
) -> SelectionHistory {
    let daily: Vec<(NaiveDate, Vec<TopEntry>)> = dates
        .par_iter()
        .map(|&date| {
            let signals = compute_daily_signals(date, universe, features, index, settings);
            (date, signals.top)
        })
        .collect();

    let mut history = SelectionHistory::new();
    for (date, top) in daily {
        history.insert(date, top);
    }
    info!(dates = history.len(), "built signal history");
    history
}
