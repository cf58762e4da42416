//! Daily price bars for instruments and the benchmark index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::indicator::ema::ewm;

/// Span of the index EMA used for regime classification.
pub const INDEX_EMA_SPAN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub turnover: f64,
    pub adj_close: f64,
}

impl PriceBar {
    /// Build a bar whose turnover and adjusted close are derived from
    /// close and volume.
    pub fn new(
        symbol: &str,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        PriceBar {
            symbol: symbol.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume,
            turnover: close * volume,
            adj_close: close,
        }
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(prev) => {
                let hc = (self.high - prev).abs();
                let lc = (self.low - prev).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexBar {
    pub date: NaiveDate,
    pub close: f64,
    pub ema50: f64,
}

/// Attach the EMA50 to a series of index closes. Input order does not
/// matter; the output is sorted by date with duplicate dates dropped.
pub fn build_index_history(mut closes: Vec<(NaiveDate, f64)>) -> Vec<IndexBar> {
    closes.sort_by_key(|(date, _)| *date);
    closes.dedup_by_key(|(date, _)| *date);

    let values: Vec<f64> = closes.iter().map(|(_, close)| *close).collect();
    let ema = ewm(&values, INDEX_EMA_SPAN);

    closes
        .into_iter()
        .zip(ema)
        .map(|((date, close), ema50)| IndexBar { date, close, ema50 })
        .collect()
}
