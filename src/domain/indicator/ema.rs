//! Exponential moving average.
//!
//! alpha = 2/(span+1), seeded with the first observation, then
//! EMA[i] = alpha*x[i] + (1-alpha)*EMA[i-1]. No finite-history bias
//! correction is applied, so every position carries a value.

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = smoothing_factor(span);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeded_from_first_value() {
        let out = ewm(&[10.0, 20.0, 30.0], 3);
        assert!((out[0] - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let out = ewm(&[10.0, 20.0, 30.0, 40.0], 3);
        let k = 0.5;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        let e3 = 40.0 * k + e2 * (1.0 - k);
        assert!((out[1] - e1).abs() < 1e-12);
        assert!((out[2] - e2).abs() < 1e-12);
        assert!((out[3] - e3).abs() < 1e-12);
    }

    #[test]
    fn ema_equal_values_stay_flat() {
        let out = ewm(&[100.0; 5], 50);
        assert!(out.iter().all(|v| (v - 100.0).abs() < f64::EPSILON));
    }

    #[test]
    fn ema_empty_input() {
        assert!(ewm(&[], 14).is_empty());
    }

    #[test]
    fn ema_lags_rising_series() {
        let values: Vec<f64> = (0..60).map(|i| 10.0 + i as f64).collect();
        let out = ewm(&values, 50);
        for i in 1..values.len() {
            assert!(out[i] < values[i]);
        }
    }

    #[test]
    fn smoothing_factor_span_14() {
        assert!((smoothing_factor(14) - 2.0 / 15.0).abs() < f64::EPSILON);
    }
}
