//! Daily top-list selection with liquidity, trend and sector filters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::regime::Regime;
use super::scoring::ScoredCandidate;
use super::universe::SymbolInfo;

pub const MAX_PER_SECTOR: usize = 2;
pub const UNIVERSE_TAG: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEntry {
    pub rank: usize,
    pub symbol: String,
    pub final_score: f64,
    pub universe_tag: String,
}

/// Pick the day's top list.
///
/// Candidates must be listed as active in `metadata`, have `adv20 >= min_adv`
/// and pass the trend gate. Survivors are taken best-first (ties by symbol)
/// with at most two per sector until the regime's limit is reached.
pub fn select_top10(
    scored: &[ScoredCandidate],
    metadata: &[SymbolInfo],
    min_adv: f64,
    regime: Regime,
) -> Vec<TopEntry> {
    let info: HashMap<&str, &SymbolInfo> =
        metadata.iter().map(|m| (m.symbol.as_str(), m)).collect();

    let mut eligible: Vec<(&ScoredCandidate, &SymbolInfo)> = scored
        .iter()
        .filter_map(|c| info.get(c.symbol.as_str()).map(|m| (c, *m)))
        .filter(|(_, m)| m.is_active)
        .filter(|(c, _)| c.adv20.is_some_and(|adv| adv >= min_adv))
        .filter(|(c, _)| c.trend_gate)
        .collect();

    eligible.sort_by(|(a, _), (b, _)| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let limit = regime.selection_limit();
    let mut sector_counts: HashMap<&str, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(limit);

    for (candidate, meta) in eligible {
        if selected.len() >= limit {
            break;
        }
        if !meta.sector.is_empty() {
            let count = sector_counts.entry(meta.sector.as_str()).or_insert(0);
            if *count >= MAX_PER_SECTOR {
                continue;
            }
            *count += 1;
        }
        selected.push(TopEntry {
            rank: selected.len() + 1,
            symbol: candidate.symbol.clone(),
            final_score: candidate.final_score,
            universe_tag: UNIVERSE_TAG.to_string(),
        });
    }

    selected
}
