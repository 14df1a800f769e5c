// Mutual information of two binary events observed over the same trials

/// I(A;B) in bits from a 2x2 contingency table.
///
/// `joint` counts trials with both events, `only_a` / `only_b` one of them,
/// `neither` the rest.
pub fn mutual_information(joint: usize, only_a: usize, only_b: usize, neither: usize) -> f64 {
    let total = (joint + only_a + only_b + neither) as f64;
    if total == 0.0 {
        return 0.0;
    }

    let a = (joint + only_a) as f64;
    let not_a = (only_b + neither) as f64;
    let b = (joint + only_b) as f64;
    let not_b = (only_a + neither) as f64;

    let cells = [
        (joint as f64, a, b),
        (only_a as f64, a, not_b),
        (only_b as f64, not_a, b),
        (neither as f64, not_a, not_b),
    ];

    cells
        .iter()
        .filter(|(n, row, col)| *n > 0.0 && *row > 0.0 && *col > 0.0)
        .map(|(n, row, col)| {
            let p_xy = n / total;
            p_xy * (p_xy / ((row / total) * (col / total))).log2()
        })
        .sum::<f64>()
        .max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfectly_dependent_events_share_one_bit() {
        // A and B always co-occur, half of the time
        assert!((mutual_information(5, 0, 0, 5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_independent_events_share_nothing() {
        assert!(mutual_information(1, 1, 1, 1).abs() < 1e-12);
        assert_eq!(mutual_information(0, 0, 0, 0), 0.0);
    }
}
