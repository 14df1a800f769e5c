// Gini coefficient

use crate::error::{Result, ShannonError};

/// Gini coefficient of non-negative values, clamped to [0, 1].
///
/// G = (2 Σ (i+1)·v_i) / (n Σ v) - (n+1)/n over ascending values.
/// With `bias_correction` the result is scaled by n/(n-1).
pub fn gini(values: &[f64], bias_correction: bool) -> Result<f64> {
    if values.is_empty() {
        return Err(ShannonError::EmptyInput("gini"));
    }
    let n = values.len();
    if n == 1 {
        return Ok(0.0);
    }

    let mut sorted: Vec<f64> = values.iter().map(|v| v.max(0.0)).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let total: f64 = sorted.iter().sum();
    if total == 0.0 {
        return Ok(0.0);
    }

    let n_f = n as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();
    let mut g = (2.0 * weighted) / (n_f * total) - (n_f + 1.0) / n_f;
    if bias_correction {
        g *= n_f / (n_f - 1.0);
    }
    Ok(g.clamp(0.0, 1.0))
}

/// Gini that treats fewer than two values as perfectly equal
pub fn gini_or_zero(values: &[f64], bias_correction: bool) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    gini(values, bias_correction).unwrap_or(0.0)
}
