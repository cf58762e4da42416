//! Per-symbol technical feature computation.
//!
//! Turns one symbol's daily bars plus the benchmark index into a table of
//! trend, relative-strength, breakout, participation, volatility, drawdown
//! and liquidity features, one row per bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::indicator::Window;
use super::indicator::ema::ewm;
use super::indicator::returns::pct_change;
use super::indicator::rolling::{rolling_max, rolling_mean, rolling_median, rolling_sum};
use super::ohlcv::{IndexBar, PriceBar};

pub const EMA_FAST_SPAN: usize = 50;
pub const EMA_SLOW_SPAN: usize = 200;
pub const ATR_SPAN: usize = 14;
pub const EMA_SLOPE_LAG: usize = 10;
pub const RS_3M_PERIODS: usize = 63;
pub const RS_6M_PERIODS: usize = 126;

const BREAKOUT_WINDOW: Window = Window::new(120, 60);
const VOLUME_WINDOW: Window = Window::new(20, 10);
const UP_RATIO_WINDOW: Window = Window::new(20, 10);
const DRAWDOWN_WINDOW: Window = Window::new(60, 30);
const ADV_WINDOW: Window = Window::new(20, 10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub ema50: f64,
    pub ema200: f64,
    pub trend_gate: bool,
    pub trend_score: f64,
    pub quality_trend: f64,
    pub rs_3m: Option<f64>,
    pub rs_6m: Option<f64>,
    pub bo_120: Option<f64>,
    pub vol_surge: Option<f64>,
    pub up_ratio_20: Option<f64>,
    pub atr14: Option<f64>,
    pub atr14_pct: Option<f64>,
    pub dd60: Option<f64>,
    pub adv20: Option<f64>,
}

fn ratio(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    match denominator {
        Some(d) if d != 0.0 && d.is_finite() && numerator.is_finite() => Some(numerator / d),
        _ => None,
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Index returns over `periods` index sessions, keyed by index date.
fn index_returns(index: &[IndexBar], periods: usize) -> HashMap<NaiveDate, f64> {
    let closes: Vec<f64> = index.iter().map(|b| b.close).collect();
    index
        .iter()
        .zip(pct_change(&closes, periods))
        .filter_map(|(bar, ret)| ret.map(|r| (bar.date, r)))
        .collect()
}

/// Compute one [`FeatureRow`] per bar. `bars` must be in ascending date
/// order without duplicate dates. Empty input yields empty output.
pub fn compute_features(bars: &[PriceBar], index: &[IndexBar]) -> Vec<FeatureRow> {
    if bars.is_empty() {
        return Vec::new();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let turnovers: Vec<f64> = bars.iter().map(|b| b.turnover).collect();

    let ema50 = ewm(&closes, EMA_FAST_SPAN);
    let ema200 = ewm(&closes, EMA_SLOW_SPAN);

    let ret_63 = pct_change(&closes, RS_3M_PERIODS);
    let ret_126 = pct_change(&closes, RS_6M_PERIODS);
    let idx_ret_63 = index_returns(index, RS_3M_PERIODS);
    let idx_ret_126 = index_returns(index, RS_6M_PERIODS);

    let hh120 = rolling_max(&closes, BREAKOUT_WINDOW);
    let vol20 = rolling_mean(&volumes, VOLUME_WINDOW);
    let peak60 = rolling_max(&closes, DRAWDOWN_WINDOW);
    let adv20 = rolling_median(&turnovers, ADV_WINDOW);

    let up_flags: Vec<f64> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| if i > 0 && c > closes[i - 1] { 1.0 } else { 0.0 })
        .collect();
    let up_counts = rolling_sum(&up_flags, UP_RATIO_WINDOW);

    let true_ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| bar.true_range((i > 0).then(|| bars[i - 1].close)))
        .collect();
    let atr14 = ewm(&true_ranges, ATR_SPAN);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let close = bar.close;
            let above_ema = close > ema50[i];
            let ema_rising = i >= EMA_SLOPE_LAG && ema50[i] > ema50[i - EMA_SLOPE_LAG];
            let trend_score =
                (0.6 * f64::from(u8::from(above_ema)) + 0.4 * f64::from(u8::from(ema_rising)))
                    * 100.0;

            let rs_3m = ret_63[i].zip(idx_ret_63.get(&bar.date)).map(|(s, x)| s - x);
            let rs_6m = ret_126[i].zip(idx_ret_126.get(&bar.date)).map(|(s, x)| s - x);

            let atr = finite(atr14[i]);

            FeatureRow {
                symbol: bar.symbol.clone(),
                date: bar.date,
                ema50: ema50[i],
                ema200: ema200[i],
                trend_gate: above_ema,
                trend_score,
                quality_trend: if ema50[i] > ema200[i] { 100.0 } else { 0.0 },
                rs_3m,
                rs_6m,
                bo_120: ratio(close, hh120[i]),
                vol_surge: ratio(bar.volume, vol20[i]),
                up_ratio_20: up_counts[i].map(|n| n / UP_RATIO_WINDOW.size as f64),
                atr14: atr,
                atr14_pct: atr.and_then(|a| ratio(a, Some(close))),
                dd60: ratio(close, peak60[i]).map(|r| 1.0 - r),
                adv20: adv20[i],
            }
        })
        .collect()
}
