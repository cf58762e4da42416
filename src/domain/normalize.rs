//! Cross-sectional normalization of a single day's feature snapshot.
//!
//! Each ranked column is winsorized to its own [2nd, 98th] percentile band
//! and then replaced by its percentile rank on a 0-100 scale, where 100 is
//! the highest value. Risk columns are ranked in the same direction as the
//! others; scoring subtracts them.

use super::features::FeatureRow;

pub const WINSOR_LOWER: f64 = 0.02;
pub const WINSOR_UPPER: f64 = 0.98;

/// Columns replaced by percentile ranks. All other columns pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankedColumn {
    Rs3m,
    Rs6m,
    TrendScore,
    Bo120,
    VolSurge,
    UpRatio20,
    QualityTrend,
    Atr14Pct,
    Dd60,
}

impl RankedColumn {
    pub const ALL: [RankedColumn; 9] = [
        RankedColumn::Rs3m,
        RankedColumn::Rs6m,
        RankedColumn::TrendScore,
        RankedColumn::Bo120,
        RankedColumn::VolSurge,
        RankedColumn::UpRatio20,
        RankedColumn::QualityTrend,
        RankedColumn::Atr14Pct,
        RankedColumn::Dd60,
    ];

    pub fn get(self, row: &FeatureRow) -> Option<f64> {
        let value = match self {
            RankedColumn::Rs3m => row.rs_3m,
            RankedColumn::Rs6m => row.rs_6m,
            RankedColumn::TrendScore => Some(row.trend_score),
            RankedColumn::Bo120 => row.bo_120,
            RankedColumn::VolSurge => row.vol_surge,
            RankedColumn::UpRatio20 => row.up_ratio_20,
            RankedColumn::QualityTrend => Some(row.quality_trend),
            RankedColumn::Atr14Pct => row.atr14_pct,
            RankedColumn::Dd60 => row.dd60,
        };
        value.filter(|v| v.is_finite())
    }

    /// Store a rank. Columns without a missing state keep their raw value
    /// when no rank exists.
    fn set(self, row: &mut FeatureRow, value: Option<f64>) {
        match self {
            RankedColumn::Rs3m => row.rs_3m = value,
            RankedColumn::Rs6m => row.rs_6m = value,
            RankedColumn::TrendScore => {
                if let Some(v) = value {
                    row.trend_score = v;
                }
            }
            RankedColumn::Bo120 => row.bo_120 = value,
            RankedColumn::VolSurge => row.vol_surge = value,
            RankedColumn::UpRatio20 => row.up_ratio_20 = value,
            RankedColumn::QualityTrend => {
                if let Some(v) = value {
                    row.quality_trend = v;
                }
            }
            RankedColumn::Atr14Pct => row.atr14_pct = value,
            RankedColumn::Dd60 => row.dd60 = value,
        }
    }
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Percentile ranks (0, 100] with tied values sharing their average rank.
/// Missing values stay missing and do not count toward the denominator.
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1));

    let n = present.len() as f64;
    let mut ranks = vec![None; values.len()];
    let mut start = 0;
    while start < present.len() {
        let mut end = start;
        while end + 1 < present.len() && present[end + 1].1 == present[start].1 {
            end += 1;
        }
        // 1-based average rank of the tie group.
        let avg_rank = (start + end) as f64 / 2.0 + 1.0;
        for &(idx, _) in &present[start..=end] {
            ranks[idx] = Some(avg_rank / n * 100.0);
        }
        start = end + 1;
    }
    ranks
}

fn winsorize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let (Some(lo), Some(hi)) = (
        quantile(&sorted, WINSOR_LOWER),
        quantile(&sorted, WINSOR_UPPER),
    ) else {
        return values.to_vec();
    };
    values.iter().map(|v| v.map(|x| x.clamp(lo, hi))).collect()
}

/// Normalize one date's snapshot (one row per symbol). Row order is kept.
pub fn normalize_cross_sectional(snapshot: &[FeatureRow]) -> Vec<FeatureRow> {
    let mut normalized = snapshot.to_vec();
    if normalized.is_empty() {
        return normalized;
    }

    for column in RankedColumn::ALL {
        let raw: Vec<Option<f64>> = snapshot.iter().map(|row| column.get(row)).collect();
        let ranks = percentile_ranks(&winsorize(&raw));
        for (row, rank) in normalized.iter_mut().zip(ranks) {
            column.set(row, rank);
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(symbol: &str, rs_3m: Option<f64>, atr14_pct: f64) -> FeatureRow {
        FeatureRow {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ema50: 10.0,
            ema200: 9.0,
            trend_gate: true,
            trend_score: 60.0,
            quality_trend: 100.0,
            rs_3m,
            rs_6m: None,
            bo_120: Some(0.9),
            vol_surge: Some(1.0),
            up_ratio_20: Some(0.5),
            atr14: Some(0.5),
            atr14_pct: Some(atr14_pct),
            dd60: Some(0.1),
            adv20: Some(12_345_678.0),
        }
    }

    #[test]
    fn empty_snapshot() {
        assert!(normalize_cross_sectional(&[]).is_empty());
    }

    #[test]
    fn quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.5), Some(3.0));
        assert!((quantile(&sorted, 0.02).unwrap() - 1.08).abs() < 1e-12);
        assert!((quantile(&sorted, 0.98).unwrap() - 4.92).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn ranks_average_ties() {
        let ranks = percentile_ranks(&[Some(1.0), Some(2.0), Some(2.0), Some(3.0)]);
        assert_eq!(ranks[0], Some(25.0));
        assert_eq!(ranks[1], Some(62.5));
        assert_eq!(ranks[2], Some(62.5));
        assert_eq!(ranks[3], Some(100.0));
    }

    #[test]
    fn ranks_skip_missing() {
        let ranks = percentile_ranks(&[Some(5.0), None, Some(1.0)]);
        assert_eq!(ranks, vec![Some(100.0), None, Some(50.0)]);
    }

    #[test]
    fn highest_value_ranks_100() {
        let snapshot = vec![
            row("A", Some(0.10), 0.02),
            row("B", Some(0.30), 0.05),
            row("C", Some(-0.20), 0.01),
        ];
        let out = normalize_cross_sectional(&snapshot);
        assert_eq!(out[1].rs_3m, Some(100.0));
        assert!((out[2].rs_3m.unwrap() - 100.0 / 3.0).abs() < 1e-9);
        // Risk columns rank in the same direction.
        assert_eq!(out[1].atr14_pct, Some(100.0));
    }

    #[test]
    fn pass_through_columns_unchanged() {
        let snapshot = vec![row("A", Some(0.1), 0.02), row("B", None, 0.03)];
        let out = normalize_cross_sectional(&snapshot);
        assert_eq!(out[0].adv20, snapshot[0].adv20);
        assert_eq!(out[0].trend_gate, snapshot[0].trend_gate);
        assert_eq!(out[0].ema50, snapshot[0].ema50);
        assert_eq!(out[0].atr14, snapshot[0].atr14);
        assert_eq!(out[1].rs_3m, None);
        assert_eq!(out[0].rs_3m, Some(100.0));
    }

    #[test]
    fn identical_values_share_rank() {
        let snapshot = vec![row("A", Some(0.1), 0.02), row("B", Some(0.2), 0.02)];
        let out = normalize_cross_sectional(&snapshot);
        assert_eq!(out[0].trend_score, 75.0);
        assert_eq!(out[1].trend_score, 75.0);
    }

    #[test]
    fn outliers_are_clipped_before_ranking() {
        let mut values: Vec<Option<f64>> = (0..100).map(|i| Some(i as f64)).collect();
        values[99] = Some(1e9);
        let clipped = winsorize(&values);
        let hi = clipped[99].unwrap();
        // 98th percentile of 0..=98 plus the outlier sits at 97.02.
        assert!((hi - 97.02).abs() < 1e-9);
        assert_eq!(clipped[50], Some(50.0));
    }
}
