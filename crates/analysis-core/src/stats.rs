//! Small numeric helpers shared by the valuation engine and the chart renderer.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Fractional change between consecutive values: `(x[i] - x[i-1]) / x[i-1]`.
///
/// The series must be in chronological order (oldest first). Returns `None` if any
/// base value is zero or non-finite, since the change would be undefined.
pub fn pct_changes(series: &[f64]) -> Option<Vec<f64>> {
    series
        .windows(2)
        .map(|w| {
            let (prev, next) = (w[0], w[1]);
            if prev == 0.0 || !prev.is_finite() || !next.is_finite() {
                None
            } else {
                Some((next - prev) / prev)
            }
        })
        .collect()
}

/// Mean of the period-over-period fractional changes, or `None` when fewer than two
/// points exist or a change is undefined.
pub fn mean_pct_change(series: &[f64]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    pct_changes(series).map(|changes| mean(&changes))
}

/// Round to a fixed number of decimal places for presentation.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Shorthand for two-decimal rounding used on monetary outputs.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_pct_changes() {
        let changes = pct_changes(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(changes.len(), 2);
        assert!((changes[0] - 0.10).abs() < 1e-12);
        assert!((changes[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_pct_changes_zero_base() {
        assert!(pct_changes(&[100.0, 0.0, 50.0]).is_none());
    }

    #[test]
    fn test_mean_pct_change_needs_two_points() {
        assert!(mean_pct_change(&[42.0]).is_none());
        let g = mean_pct_change(&[100.0, 120.0, 150.0]).unwrap();
        assert!((g - (0.20 + 0.25) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_round() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-7.899), -7.9);
        assert_eq!(round_to(0.925925925, 4), 0.9259);
    }
}
