//! Statistical outliers among per-file measurements

use std::collections::BTreeMap;

use crate::math::robust::{median, modified_z_scores};

/// Stricter than the textbook 3.5 so only extreme files are flagged
pub const OUTLIER_Z_THRESHOLD: f64 = 5.0;
const MIN_FILES: usize = 5;

/// One numeric measurement per file, as fed to [`detect_outliers`]
#[derive(Debug, Clone, Default)]
pub struct OutlierInput {
    pub cognitive_load: f64,
    pub compression_ratio: f64,
    pub impl_gini: f64,
    pub blast_radius_size: f64,
    pub in_cycle: bool,
}

/// Reasons each file stands out; files with no reason are absent
pub fn detect_outliers(files: &BTreeMap<String, OutlierInput>) -> BTreeMap<String, Vec<String>> {
    let mut outliers: BTreeMap<String, Vec<String>> = BTreeMap::new();

    if files.len() >= MIN_FILES {
        type Extractor = fn(&OutlierInput) -> f64;
        let metrics: [(&str, Extractor); 4] = [
            ("high cognitive load", |f| f.cognitive_load),
            ("high compression complexity", |f| f.compression_ratio),
            ("unequal function sizes", |f| f.impl_gini),
            ("large blast radius", |f| f.blast_radius_size),
        ];

        for (description, extract) in metrics {
            let values: Vec<f64> = files.values().map(extract).collect();
            let med = median(&values);
            let scores = modified_z_scores(&values);
            for ((path, value), z) in files.keys().zip(&values).zip(scores) {
                if z > OUTLIER_Z_THRESHOLD {
                    outliers.entry(path.clone()).or_default().push(format!(
                        "{} (value={:.3}, median={:.3}, modified_z={:.1})",
                        description, value, med, z
                    ));
                }
            }
        }
    }

    for (path, input) in files {
        if input.in_cycle {
            outliers
                .entry(path.clone())
                .or_default()
                .push("member of circular dependency".to_string());
        }
    }
    outliers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_cognitive_load_is_flagged() {
        let mut files = BTreeMap::new();
        for (i, load) in [10.0, 11.0, 12.0, 10.5, 11.5, 300.0].iter().enumerate() {
            files.insert(
                format!("f{i}.py"),
                OutlierInput {
                    cognitive_load: *load,
                    ..OutlierInput::default()
                },
            );
        }
        let outliers = detect_outliers(&files);
        assert_eq!(outliers.len(), 1);
        assert!(outliers["f5.py"][0].starts_with("high cognitive load"));
    }

    #[test]
    fn test_cycle_members_flagged_even_in_tiny_codebases() {
        let files = BTreeMap::from([(
            "a.py".to_string(),
            OutlierInput {
                in_cycle: true,
                ..OutlierInput::default()
            },
        )]);
        assert_eq!(detect_outliers(&files)["a.py"], vec!["member of circular dependency"]);
    }
}
