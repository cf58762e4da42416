//! Symbol metadata and universe restriction.
//!
//! The tradable universe is every active symbol the data source lists,
//! optionally narrowed by a comma-separated symbol list from configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub name: String,
    /// Empty when unknown; such symbols are not subject to the sector cap.
    pub sector: String,
    pub is_active: bool,
    pub list_start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Active symbols, restricted to `only` when given. Requested symbols the
/// source does not list are reported on stderr and skipped.
pub fn active_universe(listed: &[SymbolInfo], only: Option<&[String]>) -> Vec<SymbolInfo> {
    let mut universe: Vec<SymbolInfo> = listed
        .iter()
        .filter(|info| info.is_active)
        .filter(|info| only.is_none_or(|wanted| wanted.contains(&info.symbol)))
        .cloned()
        .collect();

    if let Some(wanted) = only {
        for symbol in wanted {
            if !listed.iter().any(|info| &info.symbol == symbol) {
                eprintln!("Warning: skipping {} (not in symbol list)", symbol);
            }
        }
    }

    universe.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    universe
}
