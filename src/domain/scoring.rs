//! Composite potential/risk scoring of a normalized snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::features::FeatureRow;
use super::metrics::round_to;
use super::regime::Regime;

/// Structured breakdown of a symbol's score. Scores are rounded to two
/// decimals, components to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explain {
    pub regime: Regime,
    pub potential: f64,
    pub risk: f64,
    pub components: ExplainComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainComponents {
    pub rs_6m: f64,
    pub rs_3m: f64,
    pub trend: f64,
    pub bo_120: f64,
    pub vol_surge: f64,
    pub risk_atr: f64,
    pub risk_dd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub symbol: String,
    pub date: NaiveDate,
    pub potential_score: f64,
    pub risk_score: f64,
    pub final_score: f64,
    pub explain: Explain,
    /// Raw liquidity carried through for the selection filter.
    pub adv20: Option<f64>,
    pub trend_gate: bool,
}

fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn potential_score(row: &FeatureRow) -> f64 {
    0.25 * or_zero(row.rs_6m)
        + 0.15 * or_zero(row.rs_3m)
        + 0.15 * row.trend_score
        + 0.15 * or_zero(row.bo_120)
        + 0.10 * or_zero(row.vol_surge)
        + 0.10 * or_zero(row.up_ratio_20)
        + 0.10 * row.quality_trend
}

pub fn risk_score(row: &FeatureRow) -> f64 {
    0.60 * or_zero(row.atr14_pct) + 0.40 * or_zero(row.dd60)
}

/// Score every row of a normalized snapshot. Missing inputs count as 0.
pub fn calculate_scores(normalized: &[FeatureRow], regime: Regime) -> Vec<ScoredCandidate> {
    let lambda = regime.risk_lambda();

    normalized
        .iter()
        .map(|row| {
            let potential = potential_score(row);
            let risk = risk_score(row);

            ScoredCandidate {
                symbol: row.symbol.clone(),
                date: row.date,
                potential_score: potential,
                risk_score: risk,
                final_score: potential - lambda * risk,
                explain: Explain {
                    regime,
                    potential: round_to(potential, 2),
                    risk: round_to(risk, 2),
                    components: ExplainComponents {
                        rs_6m: round_to(or_zero(row.rs_6m), 1),
                        rs_3m: round_to(or_zero(row.rs_3m), 1),
                        trend: round_to(row.trend_score, 1),
                        bo_120: round_to(or_zero(row.bo_120), 1),
                        vol_surge: round_to(or_zero(row.vol_surge), 1),
                        risk_atr: round_to(or_zero(row.atr14_pct), 1),
                        risk_dd: round_to(or_zero(row.dd60), 1),
                    },
                },
                adv20: row.adv20,
                trend_gate: row.trend_gate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked_row(symbol: &str, all: f64, risk: f64) -> FeatureRow {
        FeatureRow {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ema50: 10.0,
            ema200: 9.0,
            trend_gate: true,
            trend_score: all,
            quality_trend: all,
            rs_3m: Some(all),
            rs_6m: Some(all),
            bo_120: Some(all),
            vol_surge: Some(all),
            up_ratio_20: Some(all),
            atr14: Some(0.4),
            atr14_pct: Some(risk),
            dd60: Some(risk),
            adv20: Some(50_000_000.0),
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let row = ranked_row("A", 100.0, 100.0);
        assert!((potential_score(&row) - 100.0).abs() < 1e-9);
        assert!((risk_score(&row) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn lambda_depends_on_regime() {
        let rows = vec![ranked_row("A", 80.0, 50.0)];
        let on = calculate_scores(&rows, Regime::RiskOn);
        let off = calculate_scores(&rows, Regime::RiskOff);
        assert!((on[0].final_score - (80.0 - 0.35 * 50.0)).abs() < 1e-9);
        assert!((off[0].final_score - (80.0 - 0.55 * 50.0)).abs() < 1e-9);
    }

    #[test]
    fn missing_inputs_count_as_zero() {
        let mut row = ranked_row("A", 50.0, 20.0);
        row.rs_6m = None;
        row.dd60 = None;
        let scored = calculate_scores(&[row], Regime::RiskOn);
        let expected_potential = 0.75 * 50.0;
        assert!((scored[0].potential_score - expected_potential).abs() < 1e-9);
        assert!((scored[0].risk_score - 0.6 * 20.0).abs() < 1e-9);
        assert_eq!(scored[0].explain.components.rs_6m, 0.0);
    }

    #[test]
    fn explain_is_rounded_and_carries_regime() {
        let mut row = ranked_row("A", 33.333, 12.346);
        row.rs_3m = Some(66.666);
        let scored = calculate_scores(&[row], Regime::RiskOff);
        let explain = &scored[0].explain;
        assert_eq!(explain.regime, Regime::RiskOff);
        assert_eq!(explain.components.rs_3m, 66.7);
        assert_eq!(explain.components.trend, 33.3);
        assert_eq!(explain.risk, 12.35);
    }

    #[test]
    fn explain_serializes_with_fixed_fields() {
        let scored = calculate_scores(&[ranked_row("A", 10.0, 5.0)], Regime::RiskOn);
        let json = serde_json::to_value(&scored[0].explain).unwrap();
        assert_eq!(json["regime"], "RISK_ON");
        assert!(json["components"]["risk_dd"].is_number());
        let back: Explain = serde_json::from_value(json).unwrap();
        assert_eq!(back, scored[0].explain);
    }

    #[test]
    fn filter_columns_pass_through() {
        let mut row = ranked_row("A", 10.0, 5.0);
        row.trend_gate = false;
        let scored = calculate_scores(&[row], Regime::RiskOn);
        assert!(!scored[0].trend_gate);
        assert_eq!(scored[0].adv20, Some(50_000_000.0));
    }

    #[test]
    fn empty_snapshot() {
        assert!(calculate_scores(&[], Regime::RiskOn).is_empty());
    }
}
