// Outlier statistics that tolerate skewed distributions

/// Consistency constant relating MAD to a normal standard deviation
const MAD_CONSTANT: f64 = 0.6745;

/// Median of a slice (mean of the two middle values for even lengths)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation: median(|x - median(x)|)
pub fn mad(values: &[f64]) -> f64 {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

/// M_i = 0.6745 (x_i - median) / MAD; all zeros when MAD is zero
pub fn modified_z_scores(values: &[f64]) -> Vec<f64> {
    let med = median(values);
    let spread = mad(values);
    if spread == 0.0 {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| MAD_CONSTANT * (v - med) / spread)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_and_mad() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
        // deviations from 3: [2, 1, 0, 1, 97] -> 1
        assert_eq!(mad(&[1.0, 2.0, 3.0, 4.0, 100.0]), 1.0);
    }

    #[test]
    fn test_modified_z_flags_the_extreme_value() {
        let z = modified_z_scores(&[10.0, 11.0, 12.0, 11.0, 10.0, 95.0]);
        assert!(z[5] > 5.0);
        assert!(z[..5].iter().all(|s| s.abs() < 3.5));
    }

    #[test]
    fn test_constant_values_have_zero_scores() {
        assert_eq!(modified_z_scores(&[2.0, 2.0, 2.0]), vec![0.0, 0.0, 0.0]);
    }
}
