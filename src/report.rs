//! End-of-run report
//!
//! Owned by the aggregation loop; workers never touch it directly.

use crate::process::{JobOutcome, JobResult};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome lists for a run, in arrival order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Sources whose destination already held identical bytes
    pub skipped: Vec<PathBuf>,
    /// Sources copied under a numbered name, with their final destination
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Sources that failed, with the cause
    pub errors: Vec<(PathBuf, String)>,
    /// Sources copied under their own name
    pub copied: usize,
    /// Number of results received
    pub processed: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one job result into the report
    pub fn record(&mut self, result: &JobResult) {
        self.processed += 1;
        match &result.outcome {
            JobOutcome::Copied { .. } => self.copied += 1,
            JobOutcome::Renamed { dest } => {
                self.renamed.push((result.source.clone(), dest.clone()));
            }
            JobOutcome::Skipped { .. } => self.skipped.push(result.source.clone()),
            JobOutcome::Failed { error } => {
                self.errors.push((result.source.clone(), error.clone()));
            }
        }
    }

    /// Stamp the run duration
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One-line count summary
    pub fn summary(&self) -> String {
        format!(
            "Processed: {}, Copied: {}, Renamed: {}, Skipped: {}, Failed: {}",
            self.processed,
            self.copied,
            self.renamed.len(),
            self.skipped.len(),
            self.errors.len()
        )
    }

    /// Full text summary: skipped paths, rename mappings, failures and timing
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.skipped.is_empty() {
            lines.push("Skipped identical files:".to_string());
            lines.extend(self.skipped.iter().map(|p| format!("  {}", p.display())));
        }
        if !self.renamed.is_empty() {
            lines.push("Renamed files:".to_string());
            lines.extend(
                self.renamed
                    .iter()
                    .map(|(src, dest)| format!("  {} -> {}", src.display(), dest.display())),
            );
        }
        if !self.errors.is_empty() {
            lines.push("Failed files:".to_string());
            lines.extend(
                self.errors
                    .iter()
                    .map(|(src, cause)| format!("  {}: {}", src.display(), cause)),
            );
        }

        lines.push(format!(
            "Processed {} files in {:.2}s",
            self.processed,
            self.elapsed.as_secs_f64()
        ));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::time::ExtractedTime;

    fn result(source: &str, outcome: JobOutcome) -> JobResult {
        JobResult {
            source: PathBuf::from(source),
            kind: MediaKind::Image,
            time: ExtractedTime::now(),
            outcome,
        }
    }

    #[test]
    fn test_record_each_outcome_once() {
        let mut report = RunReport::new();
        report.record(&result("/in/a.jpg", JobOutcome::Copied { dest: "/out/a.jpg".into() }));
        report.record(&result("/in/b.jpg", JobOutcome::Skipped { existing: "/out/a.jpg".into() }));
        report.record(&result("/in/x/a.jpg", JobOutcome::Renamed { dest: "/out/a_1.jpg".into() }));
        report.record(&result("/in/c.jpg", JobOutcome::Failed { error: "disk full".into() }));

        assert_eq!(report.processed, 4);
        assert_eq!(report.copied, 1);
        assert_eq!(report.skipped, vec![PathBuf::from("/in/b.jpg")]);
        assert_eq!(
            report.renamed,
            vec![(PathBuf::from("/in/x/a.jpg"), PathBuf::from("/out/a_1.jpg"))]
        );
        assert_eq!(report.errors.len(), 1);
        assert!(report.has_errors());
        assert_eq!(
            report.summary(),
            "Processed: 4, Copied: 1, Renamed: 1, Skipped: 1, Failed: 1"
        );
    }

    #[test]
    fn test_summary_lines() {
        let mut report = RunReport::new();
        report.record(&result("/in/b.jpg", JobOutcome::Skipped { existing: "/out/b.jpg".into() }));
        report.record(&result("/in/x/a.jpg", JobOutcome::Renamed { dest: "/out/a_1.jpg".into() }));
        report.finish(Duration::from_millis(1500));

        let lines = report.summary_lines();
        assert_eq!(
            lines,
            vec![
                "Skipped identical files:".to_string(),
                "  /in/b.jpg".to_string(),
                "Renamed files:".to_string(),
                "  /in/x/a.jpg -> /out/a_1.jpg".to_string(),
                "Processed 2 files in 1.50s".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_report() {
        let report = RunReport::new();
        assert!(!report.has_errors());
        assert_eq!(report.summary_lines(), vec!["Processed 0 files in 0.00s".to_string()]);
    }
}
