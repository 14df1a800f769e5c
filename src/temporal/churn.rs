//! Per-file churn series

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::models::{ChurnSeries, GitHistory, Trajectory};
use crate::math::entropy::shannon;
use crate::math::stats::{linear_slope, mean, population_std};

/// Four weeks per window
pub const WINDOW_SECS: i64 = 4 * 7 * 86_400;
const SLOPE_THRESHOLD: f64 = 0.1;
const CV_THRESHOLD: f64 = 0.5;

const FIX_KEYWORDS: &[&str] = &["fix", "bug", "patch", "hotfix", "bugfix", "repair", "issue"];
const REFACTOR_KEYWORDS: &[&str] = &[
    "refactor",
    "cleanup",
    "clean up",
    "reorganize",
    "restructure",
    "rename",
];

#[derive(Default)]
struct FileActivity {
    windows: Vec<usize>,
    authors: HashMap<String, usize>,
    commits: usize,
    fixes: usize,
    refactors: usize,
}

/// Churn series for every analyzed file that appears in the history
pub fn build_churn_series(
    history: &GitHistory,
    analyzed: &BTreeSet<String>,
) -> BTreeMap<String, ChurnSeries> {
    let (Some(min_ts), Some(max_ts)) = (
        history.commits.iter().map(|c| c.timestamp).min(),
        history.commits.iter().map(|c| c.timestamp).max(),
    ) else {
        return BTreeMap::new();
    };
    let num_windows = ((max_ts - min_ts) / WINDOW_SECS + 1).max(1) as usize;

    let mut activity: BTreeMap<&str, FileActivity> = BTreeMap::new();
    for commit in &history.commits {
        let window = (((commit.timestamp - min_ts) / WINDOW_SECS) as usize).min(num_windows - 1);
        let subject = commit.subject.to_lowercase();
        let is_fix = FIX_KEYWORDS.iter().any(|k| subject.contains(k));
        let is_refactor = REFACTOR_KEYWORDS.iter().any(|k| subject.contains(k));

        for file in commit.files.iter().filter(|f| analyzed.contains(*f)) {
            let entry = activity.entry(file.as_str()).or_insert_with(|| FileActivity {
                windows: vec![0; num_windows],
                ..FileActivity::default()
            });
            entry.windows[window] += 1;
            *entry.authors.entry(commit.author.clone()).or_insert(0) += 1;
            entry.commits += 1;
            if is_fix {
                entry.fixes += 1;
            }
            if is_refactor {
                entry.refactors += 1;
            }
        }
    }

    activity
        .into_iter()
        .map(|(path, a)| {
            let counts: Vec<f64> = a.windows.iter().map(|&c| c as f64).collect();
            let total: usize = a.windows.iter().sum();
            let slope = linear_slope(&counts);
            let cv = coefficient_of_variation(&counts);
            let author_entropy = shannon(a.authors.values().map(|&c| c as f64));
            let ratio = |n: usize| if a.commits > 0 { n as f64 / a.commits as f64 } else { 0.0 };

            let series = ChurnSeries {
                path: path.to_string(),
                total_changes: total,
                trajectory: classify_trajectory(total, slope, cv),
                slope,
                cv,
                bus_factor: 2f64.powf(author_entropy),
                author_entropy,
                fix_ratio: ratio(a.fixes),
                refactor_ratio: ratio(a.refactors),
                change_entropy: shannon(counts.iter().copied()),
                window_counts: a.windows,
            };
            (path.to_string(), series)
        })
        .collect()
}

/// Population std / mean; 0 for fewer than two windows or no changes
pub fn coefficient_of_variation(counts: &[f64]) -> f64 {
    let m = mean(counts);
    if counts.len() < 2 || m == 0.0 {
        return 0.0;
    }
    population_std(counts) / m
}

pub fn classify_trajectory(total: usize, slope: f64, cv: f64) -> Trajectory {
    if total <= 1 || cv == 0.0 {
        Trajectory::Dormant
    } else if slope < -SLOPE_THRESHOLD && cv < CV_THRESHOLD {
        Trajectory::Stabilizing
    } else if slope > SLOPE_THRESHOLD && cv > CV_THRESHOLD {
        Trajectory::Spiking
    } else if cv > CV_THRESHOLD {
        Trajectory::Churning
    } else {
        Trajectory::Stable
    }
}
