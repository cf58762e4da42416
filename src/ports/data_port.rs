//! Price-history source port.
//!
//! File-based and live providers implement the same three capabilities;
//! the domain never knows which one supplied the data.

use crate::domain::error::TrendrankError;
use crate::domain::ohlcv::{IndexBar, PriceBar};
use crate::domain::universe::SymbolInfo;
use chrono::NaiveDate;

pub trait DataPort {
    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, TrendrankError>;

    /// Bars for `symbol` within `[start_date, end_date]`, ascending and
    /// unique by date. An unknown symbol yields an empty history.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TrendrankError>;

    /// Index closes within `[start_date, end_date]` with EMA50 attached.
    fn fetch_index(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<IndexBar>, TrendrankError>;
}
