//! Percentile normalization of per-file signals

use std::collections::BTreeMap;

use super::models::{FileSignals, NormalizationTier, SignalField};
use crate::math::stats::percentile_rank;

/// Signals that receive a percentile in BAYESIAN and FULL tiers
pub const NORMALIZABLE_SIGNALS: &[&str] = &[
    "lines",
    "function_count",
    "class_count",
    "max_nesting",
    "impl_gini",
    "stub_ratio",
    "import_count",
    "concept_count",
    "concept_entropy",
    "naming_drift",
    "todo_density",
    "pagerank",
    "betweenness",
    "in_degree",
    "out_degree",
    "blast_radius_size",
    "depth",
    "phantom_import_count",
    "compression_ratio",
    "semantic_coherence",
    "cognitive_load",
    "total_changes",
    "churn_slope",
    "churn_cv",
    "bus_factor",
    "author_entropy",
    "fix_ratio",
    "refactor_ratio",
];

/// Below these raw values a file is never "high" on the signal,
/// whatever its rank in a small or uniform codebase.
pub const ABSOLUTE_FLOORS: &[(&str, f64)] = &[
    ("pagerank", 0.005),
    ("blast_radius_size", 5.0),
    ("cognitive_load", 10.0),
    ("lines", 100.0),
];

fn floor_for(signal: &str) -> Option<f64> {
    ABSOLUTE_FLOORS
        .iter()
        .find(|(name, _)| *name == signal)
        .map(|(_, floor)| *floor)
}

/// Fill `percentiles` on every file. No-op in the ABSOLUTE tier.
pub fn normalize(field: &mut SignalField) {
    if field.tier == NormalizationTier::Absolute || field.per_file.is_empty() {
        return;
    }

    let mut sorted: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for signal in NORMALIZABLE_SIGNALS {
        let mut values: Vec<f64> = field
            .per_file
            .values()
            .filter_map(|f| f.get(signal))
            .collect();
        values.sort_by(f64::total_cmp);
        sorted.insert(signal, values);
    }

    for file in field.per_file.values_mut() {
        file.percentiles = file_percentiles(file, &sorted);
    }
}

fn file_percentiles(file: &FileSignals, sorted: &BTreeMap<&str, Vec<f64>>) -> BTreeMap<String, f64> {
    let mut percentiles = BTreeMap::new();
    for (signal, values) in sorted {
        let Some(value) = file.get(signal) else {
            continue;
        };
        let pctl = match floor_for(signal) {
            Some(floor) if value < floor => 0.0,
            _ => percentile_rank(values, value),
        };
        percentiles.insert(signal.to_string(), pctl);
    }
    percentiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with_lines(tier: NormalizationTier, lines: &[usize]) -> SignalField {
        let mut field = SignalField::new(tier);
        for (i, n) in lines.iter().enumerate() {
            let mut file = FileSignals::new(format!("src/f{i}.py"));
            file.lines = *n;
            field.per_file.insert(file.path.clone(), file);
        }
        field
    }

    #[test]
    fn test_absolute_tier_skips_percentiles() {
        let mut field = field_with_lines(NormalizationTier::Absolute, &[10, 500, 900]);
        normalize(&mut field);
        assert!(field.per_file.values().all(|f| f.percentiles.is_empty()));
    }

    #[test]
    fn test_percentiles_respect_floors() {
        let mut field = field_with_lines(NormalizationTier::Bayesian, &[10, 50, 200, 400]);
        normalize(&mut field);

        // 50 lines ranks second of four, but sits under the 100-line floor
        assert_eq!(field.per_file["src/f1.py"].percentile("lines"), 0.0);
        assert_eq!(field.per_file["src/f2.py"].percentile("lines"), 0.75);
        assert_eq!(field.per_file["src/f3.py"].percentile("lines"), 1.0);
    }
}
