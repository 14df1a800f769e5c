//! Composite scores built from raw signals and percentiles
//!
//! Every composite lies in [0, 1]. Percentile-based composites are only
//! computed when the codebase is large enough to have percentiles.

use super::models::{FileSignals, ModuleSignals, NormalizationTier, SignalField};
use crate::math::stats::mean;
use crate::scanning::FileSyntax;

/// Pagerank percentile above which a file counts as critical
const CRITICAL_PAGERANK_PCTL: f64 = 0.75;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// How hard a file is to hold in your head
///
/// `log2(lines + 1) * (1 + complexity / 10) * (1 + max_nesting / 5) * (1 + impl_gini)`
pub fn cognitive_load(syntax: &FileSyntax) -> f64 {
    if syntax.lines == 0 {
        return 0.0;
    }
    let size = (syntax.lines as f64 + 1.0).log2();
    size * (1.0 + syntax.complexity() / 10.0)
        * (1.0 + syntax.max_nesting() as f64 / 5.0)
        * (1.0 + syntax.impl_gini())
}

fn instability_factor(file: &FileSignals) -> f64 {
    if file.churn_trajectory.is_volatile() {
        1.0
    } else {
        0.3
    }
}

/// Max-normalized risk on raw values; feeds the health Laplacian
pub fn raw_risk(
    file: &FileSignals,
    max_pagerank: f64,
    max_blast: f64,
    max_cognitive: f64,
    max_bus_factor: f64,
) -> f64 {
    let ratio = |value: f64, max: f64| if max > 0.0 { value / max } else { 0.0 };
    let bf_term = if max_bus_factor > 0.0 {
        1.0 - file.bus_factor / max_bus_factor
    } else {
        0.0
    };
    clamp01(
        0.25 * ratio(file.pagerank, max_pagerank)
            + 0.20 * ratio(file.blast_radius_size as f64, max_blast)
            + 0.20 * ratio(file.cognitive_load, max_cognitive)
            + 0.20 * instability_factor(file)
            + 0.15 * bf_term,
    )
}

pub fn compute_raw_risks(field: &mut SignalField) {
    let files = &field.per_file;
    let max_of = |f: fn(&FileSignals) -> f64, default: f64| {
        files.values().map(f).reduce(f64::max).unwrap_or(default)
    };
    let max_pr = max_of(|f| f.pagerank, 0.0);
    let max_blast = max_of(|f| f.blast_radius_size as f64, 0.0);
    let max_cog = max_of(|f| f.cognitive_load, 0.0);
    let max_bf = max_of(|f| f.bus_factor, 1.0);

    for file in field.per_file.values_mut() {
        file.raw_risk = raw_risk(file, max_pr, max_blast, max_cog, max_bf);
    }
}

pub fn risk_score(file: &FileSignals, max_bus_factor: f64) -> f64 {
    clamp01(
        0.25 * file.percentile("pagerank")
            + 0.20 * file.percentile("blast_radius_size")
            + 0.20 * file.percentile("cognitive_load")
            + 0.20 * instability_factor(file)
            + 0.15 * (1.0 - file.bus_factor / max_bus_factor.max(1.0)),
    )
}

/// Higher is better wired
pub fn wiring_quality(file: &FileSignals) -> f64 {
    let orphan = if file.is_orphan { 1.0 } else { 0.0 };
    let phantom = file.phantom_import_count as f64 / file.import_count.max(1) as f64;
    clamp01(1.0 - (0.30 * orphan + 0.25 * file.stub_ratio + 0.25 * phantom))
}

/// Needs `risk_score` and `wiring_quality` already set
pub fn file_health(file: &FileSignals) -> f64 {
    let orphan = if file.is_orphan { 1.0 } else { 0.0 };
    clamp01(
        1.0 - (0.25 * file.risk_score
            + 0.25 * (1.0 - file.wiring_quality)
            + 0.20 * file.percentile("cognitive_load")
            + 0.15 * file.stub_ratio
            + 0.15 * orphan),
    )
}

/// Isolated modules have no main-sequence distance; the remaining
/// weights are scaled by 1.25 to still sum to one.
pub fn module_health(module: &ModuleSignals, mean_stub: f64) -> f64 {
    let base = 0.20 * module.cohesion
        + 0.15 * (1.0 - module.coupling)
        + 0.15 * module.boundary_alignment
        + 0.15 * module.role_consistency
        + 0.15 * (1.0 - mean_stub);
    let health = match module.instability {
        Some(_) => base + 0.20 * (1.0 - module.main_seq_distance),
        None => base * 1.25,
    };
    clamp01(health)
}

fn module_mean_stub(field: &SignalField, module: &str) -> f64 {
    let stubs: Vec<f64> = field
        .per_file
        .values()
        .filter(|f| f.module_path == module)
        .map(|f| f.stub_ratio)
        .collect();
    mean(&stubs)
}

pub fn wiring_score(field: &SignalField) -> f64 {
    let g = &field.global;
    let stubs: Vec<f64> = field.per_file.values().map(|f| f.stub_ratio).collect();
    clamp01(
        1.0 - (0.25 * g.orphan_ratio
            + 0.25 * g.phantom_ratio
            + 0.20 * g.glue_deficit
            + 0.15 * mean(&stubs)
            + 0.15 * g.clone_ratio),
    )
}

pub fn architecture_health(field: &SignalField) -> f64 {
    if field.per_module.is_empty() {
        return 0.0;
    }
    let modules: Vec<&ModuleSignals> = field.per_module.values().collect();
    let collect = |f: fn(&ModuleSignals) -> f64| modules.iter().map(|m| f(m)).collect::<Vec<_>>();
    let distances: Vec<f64> = modules
        .iter()
        .filter(|m| m.instability.is_some())
        .map(|m| m.main_seq_distance)
        .collect();

    clamp01(
        0.25 * (1.0 - field.global.violation_rate)
            + 0.20 * mean(&collect(|m| m.cohesion))
            + 0.20 * (1.0 - mean(&collect(|m| m.coupling)))
            + 0.20 * (1.0 - mean(&distances))
            + 0.15 * mean(&collect(|m| m.boundary_alignment)),
    )
}

/// Smallest bus factor among central files, else among all files
pub fn min_bus_factor_critical(field: &SignalField) -> f64 {
    let critical = field
        .per_file
        .values()
        .filter(|f| f.percentile("pagerank") > CRITICAL_PAGERANK_PCTL)
        .map(|f| f.bus_factor)
        .reduce(f64::min);
    critical
        .or_else(|| field.per_file.values().map(|f| f.bus_factor).reduce(f64::min))
        .unwrap_or(1.0)
}

/// Higher means more organizational risk
pub fn team_risk(field: &SignalField) -> f64 {
    let bf_term = min_bus_factor_critical(field).min(3.0) / 3.0;
    let max_gini = field
        .per_module
        .values()
        .map(|m| m.knowledge_gini)
        .reduce(f64::max)
        .unwrap_or(0.0);
    let coords: Vec<f64> = field
        .per_module
        .values()
        .map(|m| m.coordination_cost)
        .collect();
    let coord_term = mean(&coords).min(5.0) / 5.0;

    let good = 0.30 * bf_term
        + 0.25 * (1.0 - max_gini)
        + 0.25 * (1.0 - coord_term)
        + 0.20 * field.global.conway_alignment;
    clamp01(1.0 - good)
}

pub fn codebase_health(field: &SignalField) -> f64 {
    let g = &field.global;
    let team = g.team_size as f64;
    let global_bf = min_bus_factor_critical(field).min(team);
    clamp01(
        0.30 * g.architecture_health
            + 0.30 * g.wiring_score
            + 0.20 * global_bf / team.max(1.0)
            + 0.20 * g.modularity,
    )
}

/// Fill every composite in place; percentiles must already be set
pub fn compute_composites(field: &mut SignalField) {
    if field.tier == NormalizationTier::Absolute {
        return;
    }

    let max_bf = field
        .per_file
        .values()
        .map(|f| f.bus_factor)
        .reduce(f64::max)
        .unwrap_or(1.0);
    for file in field.per_file.values_mut() {
        file.risk_score = risk_score(file, max_bf);
        file.wiring_quality = wiring_quality(file);
        file.file_health_score = file_health(file);
    }

    let stubs: Vec<(String, f64)> = field
        .per_module
        .keys()
        .map(|path| (path.clone(), module_mean_stub(field, path)))
        .collect();
    for (path, mean_stub) in stubs {
        if let Some(module) = field.per_module.get_mut(&path) {
            module.health_score = module_health(module, mean_stub);
        }
    }

    field.global.wiring_score = wiring_score(field);
    field.global.architecture_health = architecture_health(field);
    field.global.team_risk = team_risk(field);
    field.global.codebase_health = codebase_health(field);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::models::FunctionDef;
    use crate::temporal::Trajectory;

    #[test]
    fn test_cognitive_load_grows_with_nesting() {
        let mut flat = FileSyntax::empty("a.py", "python");
        flat.lines = 127;
        assert_eq!(cognitive_load(&FileSyntax::empty("empty.py", "python")), 0.0);

        // 7 bits of size, complexity 1 for a function-less file
        assert!((cognitive_load(&flat) - 7.0 * 1.1).abs() < 1e-9);

        let mut nested = flat.clone();
        nested.functions = vec![FunctionDef {
            name: "walk".into(),
            params: vec![],
            body_tokens: 40,
            signature_tokens: 2,
            nesting_depth: 4,
            start_line: 1,
            end_line: 20,
            call_targets: Some(vec![]),
            decorators: vec![],
        }];
        assert!(cognitive_load(&nested) > cognitive_load(&flat));
    }

    #[test]
    fn test_raw_risk_is_max_normalized() {
        let mut file = FileSignals::new("core.py");
        file.pagerank = 0.2;
        file.blast_radius_size = 10;
        file.cognitive_load = 30.0;
        file.bus_factor = 1.0;
        file.churn_trajectory = Trajectory::Spiking;

        let risk = raw_risk(&file, 0.2, 10.0, 30.0, 2.0);
        // 0.25 + 0.20 + 0.20 + 0.20 + 0.15 * 0.5
        assert!((risk - 0.925).abs() < 1e-9);

        let quiet = FileSignals::new("leaf.py");
        // Only the baseline instability factor remains
        assert!((raw_risk(&quiet, 0.0, 0.0, 0.0, 1.0) - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_module_health_without_instability_rescales() {
        let module = ModuleSignals {
            path: "pkg".into(),
            cohesion: 1.0,
            coupling: 0.0,
            boundary_alignment: 1.0,
            role_consistency: 1.0,
            instability: None,
            ..ModuleSignals::default()
        };
        assert!((module_health(&module, 0.0) - 1.0).abs() < 1e-9);

        let anchored = ModuleSignals {
            instability: Some(0.5),
            main_seq_distance: 0.5,
            ..module
        };
        assert!((module_health(&anchored, 0.0) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_wiring_quality_penalizes_orphans_and_phantoms() {
        let mut file = FileSignals::new("lonely.py");
        assert_eq!(wiring_quality(&file), 1.0);
        file.is_orphan = true;
        file.import_count = 2;
        file.phantom_import_count = 1;
        assert!((wiring_quality(&file) - (1.0 - 0.30 - 0.125)).abs() < 1e-9);
    }
}
