/// Progress reporting for long-running CLI operations
///
/// Provides user-friendly progress updates to stderr, leaving stdout
/// clean for piped output.
use std::time::Instant;

pub struct ProgressReporter {
    start_time: Instant,
    last_report: Option<Instant>,
    quiet: bool,
}

impl ProgressReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            start_time: Instant::now(),
            last_report: None,
            quiet,
        }
    }

    pub fn stage(&self, message: &str) {
        if !self.quiet {
            eprintln!("🚀 {}", message);
        }
    }

    /// Report scan progress (throttled to avoid spam)
    pub fn report(&mut self, processed: usize, total: usize) {
        if self.quiet {
            return;
        }
        // Throttle: only report every 100ms, but always show the last batch
        let now = Instant::now();
        if let Some(last) = self.last_report {
            if now.duration_since(last).as_millis() < 100 && processed < total {
                return;
            }
        }
        self.last_report = Some(now);

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            processed as f64 / elapsed
        } else {
            0.0
        };
        let pct = if total > 0 {
            (processed as f64 / total as f64 * 100.0) as u32
        } else {
            0
        };

        eprintln!(
            "⚡ Scanning: {}/{} ({}%) - {:.0} files/sec",
            processed, total, pct, rate
        );
    }

    pub fn complete(&self, files: usize, findings: usize) {
        if self.quiet {
            return;
        }
        eprintln!(
            "✅ Analyzed {} files in {:.2}s: {} findings",
            files,
            self.start_time.elapsed().as_secs_f64(),
            findings
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter_throttles_but_reports_completion() {
        let mut reporter = ProgressReporter::new(false);
        for i in (0..=100).step_by(10) {
            reporter.report(i, 100);
        }
        assert!(reporter.last_report.is_some());
        reporter.complete(100, 3);
    }

    #[test]
    fn test_quiet_reporter_records_nothing() {
        let mut reporter = ProgressReporter::new(true);
        reporter.report(5, 10);
        assert!(reporter.last_report.is_none());
    }
}
