// Shannon entropy over count distributions

use std::collections::HashMap;
use std::hash::Hash;

/// H(X) = -Σ p(x) log2 p(x), in bits. Zero for an empty or all-zero distribution.
pub fn shannon<I>(counts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let counts: Vec<f64> = counts.into_iter().filter(|c| *c > 0.0).collect();
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .map(|c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy divided by log2(N) where N is the number of distinct events
pub fn normalized<I>(counts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let counts: Vec<f64> = counts.into_iter().collect();
    let n = counts.len();
    if n <= 1 {
        return 0.0;
    }
    let max_h = (n as f64).log2();
    if max_h > 0.0 { shannon(counts) / max_h } else { 0.0 }
}

/// Entropy of a keyed count map
pub fn shannon_of<K: Eq + Hash>(counts: &HashMap<K, usize>) -> f64 {
    shannon(counts.values().map(|&c| c as f64))
}

/// D_KL(P || Q) in bits. Infinite when P has mass where Q has none.
pub fn kl_divergence<K: Eq + Hash>(p: &HashMap<K, f64>, q: &HashMap<K, f64>) -> f64 {
    let total_p: f64 = p.values().sum();
    let total_q: f64 = q.values().sum();
    if total_p == 0.0 || total_q == 0.0 {
        return 0.0;
    }

    let mut divergence = 0.0;
    for (key, count_p) in p {
        let prob_p = count_p / total_p;
        let prob_q = q.get(key).copied().unwrap_or(0.0) / total_q;
        if prob_p > 0.0 && prob_q == 0.0 {
            return f64::INFINITY;
        }
        if prob_p > 0.0 {
            divergence += prob_p * (prob_p / prob_q).log2();
        }
    }
    divergence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_distribution_has_log2_n_bits() {
        assert!((shannon([1.0, 1.0, 1.0, 1.0]) - 2.0).abs() < 1e-12);
        assert!((normalized([5.0, 5.0, 5.0, 5.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_distributions() {
        assert_eq!(shannon(Vec::<f64>::new()), 0.0);
        assert_eq!(shannon([0.0, 0.0]), 0.0);
        assert_eq!(shannon([7.0]), 0.0);
        assert_eq!(normalized([3.0]), 0.0);
    }

    #[test]
    fn test_kl_divergence() {
        let p: HashMap<&str, f64> = [("a", 1.0), ("b", 1.0)].into_iter().collect();
        let same = p.clone();
        assert!(kl_divergence(&p, &same).abs() < 1e-12);

        let q: HashMap<&str, f64> = [("a", 1.0)].into_iter().collect();
        assert!(kl_divergence(&p, &q).is_infinite());
    }
}
