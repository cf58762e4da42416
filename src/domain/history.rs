//! Date-indexed histories handed to the backtest.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::features::FeatureRow;
use super::ohlcv::{IndexBar, PriceBar};
use super::selection::TopEntry;

/// One symbol's bars with O(1) lookup by date.
#[derive(Debug, Clone)]
pub struct SymbolHistory {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl SymbolHistory {
    /// Bars are sorted by date; later duplicates of a date are dropped.
    pub fn new(symbol: String, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by_key(|bar| bar.date);
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            symbol,
            bars,
            date_index,
        }
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }
}

/// Price histories for the whole universe, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    symbols: HashMap<String, SymbolHistory>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, history: SymbolHistory) {
        self.symbols.insert(history.symbol.clone(), history);
    }

    /// Group loose bars by symbol.
    pub fn from_bars(bars: Vec<PriceBar>) -> Self {
        let mut grouped: HashMap<String, Vec<PriceBar>> = HashMap::new();
        for bar in bars {
            grouped.entry(bar.symbol.clone()).or_default().push(bar);
        }
        let mut history = Self::new();
        for (symbol, bars) in grouped {
            history.insert(SymbolHistory::new(symbol, bars));
        }
        history
    }

    pub fn get_bar(&self, symbol: &str, date: NaiveDate) -> Option<&PriceBar> {
        self.symbols.get(symbol)?.get_bar(date)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when no symbol has a single bar.
    pub fn is_empty(&self) -> bool {
        self.symbols.values().all(|h| h.bars.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolHistory> {
        self.symbols.values()
    }
}

/// Feature rows keyed by symbol then date.
#[derive(Debug, Clone, Default)]
pub struct FeatureHistory {
    rows: HashMap<String, HashMap<NaiveDate, FeatureRow>>,
}

impl FeatureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: FeatureRow) {
        self.rows
            .entry(row.symbol.clone())
            .or_default()
            .insert(row.date, row);
    }

    pub fn get(&self, symbol: &str, date: NaiveDate) -> Option<&FeatureRow> {
        self.rows.get(symbol)?.get(&date)
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<FeatureRow> for FeatureHistory {
    fn from_iter<I: IntoIterator<Item = FeatureRow>>(iter: I) -> Self {
        let mut history = Self::new();
        for row in iter {
            history.insert(row);
        }
        history
    }
}

/// Persisted top lists, one ranked list per signal date.
#[derive(Debug, Clone, Default)]
pub struct SelectionHistory {
    by_date: BTreeMap<NaiveDate, Vec<TopEntry>>,
}

impl SelectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a day's list, ordered by rank.
    pub fn insert(&mut self, date: NaiveDate, mut entries: Vec<TopEntry>) {
        entries.sort_by_key(|e| e.rank);
        self.by_date.insert(date, entries);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&[TopEntry]> {
        self.by_date.get(&date).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// Index lookup by date.
#[derive(Debug, Clone, Default)]
pub struct IndexHistory {
    bars: Vec<IndexBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl IndexHistory {
    /// `bars` must already be sorted and unique by date, as produced by
    /// `build_index_history`.
    pub fn new(bars: Vec<IndexBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self { bars, date_index }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&IndexBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn bars(&self) -> &[IndexBar] {
        &self.bars
    }

    /// All bars on or before `date`.
    pub fn up_to(&self, date: NaiveDate) -> &[IndexBar] {
        let end = self.bars.partition_point(|bar| bar.date <= date);
        &self.bars[..end]
    }

    /// Index dates within `[start, end]`, ascending.
    pub fn timeline(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        self.bars
            .iter()
            .map(|bar| bar.date)
            .filter(|d| *d >= start && *d <= end)
            .collect()
    }
}
