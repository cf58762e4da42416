#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;
use trendrank::domain::error::TrendrankError;
use trendrank::domain::features::FeatureRow;
pub use trendrank::domain::ohlcv::{IndexBar, PriceBar, build_index_history};
use trendrank::domain::history::{FeatureHistory, SelectionHistory};
use trendrank::domain::selection::{TopEntry, UNIVERSE_TAG};
use trendrank::domain::universe::SymbolInfo;
use trendrank::ports::data_port::DataPort;

pub const INDEX_NAME: &str = "XU100";

pub struct MockDataPort {
    pub symbols: Vec<SymbolInfo>,
    pub bars: HashMap<String, Vec<PriceBar>>,
    pub index: HashMap<String, Vec<(NaiveDate, f64)>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            bars: HashMap::new(),
            index: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: &str, sector: &str, bars: Vec<PriceBar>) -> Self {
        self.symbols.push(symbol_info(symbol, sector));
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_index(mut self, name: &str, closes: Vec<(NaiveDate, f64)>) -> Self {
        self.index.insert(name.to_string(), closes);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.symbols.push(symbol_info(symbol, ""));
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TrendrankError> {
        Ok(self.symbols.clone())
    }

    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TrendrankError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendrankError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_index(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IndexBar>, TrendrankError> {
        let closes = self
            .index
            .get(name)
            .map(|closes| {
                closes
                    .iter()
                    .filter(|(d, _)| *d >= start_date && *d <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        Ok(build_index_history(closes))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` weekdays starting at `start` (inclusive when it is a weekday).
pub fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut day = start;
    while days.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

pub fn symbol_info(symbol: &str, sector: &str) -> SymbolInfo {
    SymbolInfo {
        symbol: symbol.to_string(),
        name: format!("{symbol} A.S."),
        sector: sector.to_string(),
        is_active: true,
        list_start_date: None,
    }
}

pub fn make_bar(symbol: &str, date: NaiveDate, open: f64, close: f64) -> PriceBar {
    PriceBar::new(
        symbol,
        date,
        open,
        open.max(close) + 0.1,
        open.min(close) - 0.1,
        close,
        1_000_000.0,
    )
}

/// Bars whose open and close both rise by `step` each session.
pub fn rising_bars(symbol: &str, days: &[NaiveDate], start: f64, step: f64) -> Vec<PriceBar> {
    days.iter()
        .enumerate()
        .map(|(i, &d)| {
            let open = start + step * i as f64;
            make_bar(symbol, d, open, open + step / 2.0)
        })
        .collect()
}

/// Flat bars at `before` that gap to `after` from session `gap_at` onward.
pub fn gap_bars(
    symbol: &str,
    days: &[NaiveDate],
    before: f64,
    after: f64,
    gap_at: usize,
) -> Vec<PriceBar> {
    days.iter()
        .enumerate()
        .map(|(i, &d)| {
            let price = if i < gap_at { before } else { after };
            make_bar(symbol, d, price, price)
        })
        .collect()
}

pub fn index_closes(days: &[NaiveDate], start: f64, step: f64) -> Vec<(NaiveDate, f64)> {
    days.iter()
        .enumerate()
        .map(|(i, &d)| (d, start + step * i as f64))
        .collect()
}

pub fn rising_index(days: &[NaiveDate]) -> Vec<IndexBar> {
    build_index_history(index_closes(days, 1000.0, 5.0))
}

/// A feature row with fixed EMA50 and ATR and a passing trend gate.
pub fn feature_row(symbol: &str, date: NaiveDate, ema50: f64, atr14: f64) -> FeatureRow {
    FeatureRow {
        symbol: symbol.to_string(),
        date,
        ema50,
        ema200: ema50,
        trend_gate: true,
        trend_score: 100.0,
        quality_trend: 100.0,
        rs_3m: None,
        rs_6m: None,
        bo_120: None,
        vol_surge: None,
        up_ratio_20: None,
        atr14: Some(atr14),
        atr14_pct: None,
        dd60: None,
        adv20: Some(50_000_000.0),
    }
}

pub fn fixed_features(symbol: &str, days: &[NaiveDate], ema50: f64, atr14: f64) -> FeatureHistory {
    days.iter()
        .map(|&d| feature_row(symbol, d, ema50, atr14))
        .collect()
}

pub fn top_entry(rank: usize, symbol: &str, final_score: f64) -> TopEntry {
    TopEntry {
        rank,
        symbol: symbol.to_string(),
        final_score,
        universe_tag: UNIVERSE_TAG.to_string(),
    }
}

/// The same equally scored top list on every date.
pub fn constant_selections(days: &[NaiveDate], symbols: &[&str]) -> SelectionHistory {
    let mut history = SelectionHistory::new();
    for &d in days {
        let entries = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| top_entry(i + 1, s, 80.0))
            .collect();
        history.insert(d, entries);
    }
    history
}
