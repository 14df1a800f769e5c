//! Runs every applicable finder and ranks the results

use rayon::prelude::*;
use tracing::{debug, info};

use super::finders::all_finders;
use super::models::Finding;
use super::store::{AnalysisStore, Requirement};

/// A detector that turns signals into findings
pub trait Finder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store slots that must be filled for this finder to run
    fn requires(&self) -> &'static [Requirement];

    fn find(&self, store: &AnalysisStore) -> Vec<Finding>;
}

pub struct InsightEngine {
    finders: Vec<Box<dyn Finder>>,
    max_findings: usize,
}

impl InsightEngine {
    pub fn new(max_findings: usize) -> Self {
        Self::with_finders(all_finders(), max_findings)
    }

    pub fn with_finders(finders: Vec<Box<dyn Finder>>, max_findings: usize) -> Self {
        Self {
            finders,
            max_findings,
        }
    }

    pub fn finder_names(&self) -> Vec<&'static str> {
        self.finders.iter().map(|f| f.name()).collect()
    }

    /// Findings sorted by severity (highest first), then title, capped
    pub fn run(&self, store: &AnalysisStore) -> Vec<Finding> {
        let runnable: Vec<&dyn Finder> = self
            .finders
            .iter()
            .map(|f| f.as_ref())
            .filter(|f| {
                let ready = f.requires().iter().all(|r| store.has(*r));
                if !ready {
                    debug!("Skipping finder {}: inputs unavailable", f.name());
                }
                ready
            })
            .collect();

        let mut findings: Vec<Finding> = runnable
            .par_iter()
            .flat_map_iter(|finder| {
                let found = finder.find(store);
                debug!("Finder {} produced {} findings", finder.name(), found.len());
                found
            })
            .collect();

        findings.sort_by(|a, b| {
            b.severity
                .total_cmp(&a.severity)
                .then_with(|| a.title.cmp(&b.title))
        });
        let total = findings.len();
        findings.truncate(self.max_findings);

        info!(
            "🔎 {} finders ran, {} findings ({} kept)",
            runnable.len(),
            total,
            findings.len()
        );
        findings
    }
}
