//! Period-over-period percentage change.

/// `values[i] / values[i - periods] - 1`, or `None` for the first
/// `periods` positions and where the base value is zero.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &current)| {
            if i < periods {
                return None;
            }
            let base = values[i - periods];
            if base == 0.0 || !base.is_finite() || !current.is_finite() {
                None
            } else {
                Some(current / base - 1.0)
            }
        })
        .collect()
}
