//! Trailing window statistics with a minimum-observation threshold.
//!
//! Non-finite inputs do not count as observations.

use super::Window;

fn rolling<F>(values: &[f64], window: Window, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut scratch: Vec<f64> = Vec::with_capacity(window.size);
    (0..values.len())
        .map(|i| {
            scratch.clear();
            scratch.extend(
                values[window.start(i)..=i]
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite()),
            );
            if scratch.len() < window.min_periods.max(1) {
                None
            } else {
                Some(reduce(&scratch))
            }
        })
        .collect()
}

pub fn rolling_max(values: &[f64], window: Window) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_sum(values: &[f64], window: Window) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum())
}

pub fn rolling_mean(values: &[f64], window: Window) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_median(values: &[f64], window: Window) -> Vec<Option<f64>> {
    rolling(values, window, median)
}

fn median(window: &[f64]) -> f64 {
    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
