//! Main file processor
//!
//! Handles the core logic of:
//! - Scanning the source tree for media files
//! - Resolving capture times
//! - Placing each file in the date tree without overwriting anything
//! - Aggregating per-file outcomes into a [`RunReport`]

use crate::config::Config;
use crate::destination::{DirectoryLocks, Outcome, build_destination_path, resolve_destination};
use crate::error::Result;
use crate::media::{MediaFile, MediaKind};
use crate::pool::{WorkerPool, available_units, effective_workers};
use crate::report::RunReport;
use crate::time::{ExtractedTime, extract_time};
use crate::transfer::transfer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Level, debug, error, info, span, warn};
use walkdir::WalkDir;

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Source file path
    pub source: PathBuf,
    /// Media kind of the source
    pub kind: MediaKind,
    /// Capture time used for placement
    pub time: ExtractedTime,
    /// What happened to the file
    pub outcome: JobOutcome,
}

/// Exactly one of these holds for every processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Copied under its own name
    Copied { dest: PathBuf },
    /// Copied under a numbered name because the original name was taken
    Renamed { dest: PathBuf },
    /// Destination already held identical bytes; nothing written
    Skipped { existing: PathBuf },
    /// Placement failed; nothing recorded as copied or skipped
    Failed { error: String },
}

/// Main processor for organizing media files
pub struct Processor {
    config: Arc<Config>,
    locks: DirectoryLocks,
}

impl Processor {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            locks: DirectoryLocks::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Walk the source tree and keep supported media files
    ///
    /// Any traversal error aborts the run. Files are sorted by path.
    pub fn collect_files(&self) -> Result<Vec<MediaFile>> {
        let mut files = Vec::new();
        let mut ignored = 0usize;

        for entry in WalkDir::new(&self.config.source_dir).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            match MediaFile::classify(entry.into_path()) {
                Some(file) => files.push(file),
                None => ignored += 1,
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = files.len(), ignored, "Collected media files");
        Ok(files)
    }

    /// Collect and process every media file under the source root
    pub fn run(&self) -> Result<RunReport> {
        let files = self.collect_files()?;
        self.process_files(files, |_| {})
    }

    /// Process `files` on the worker pool
    ///
    /// `observer` runs on the calling thread after each result has been
    /// recorded. Per-file failures end up in the report; only pool setup
    /// can fail the whole call.
    pub fn process_files<F>(&self, files: Vec<MediaFile>, mut observer: F) -> Result<RunReport>
    where
        F: FnMut(&JobResult),
    {
        let _span = span!(Level::INFO, "processor_run").entered();
        let started = Instant::now();
        let mut report = RunReport::new();

        if files.is_empty() {
            info!("No files to process");
            report.finish(started.elapsed());
            return Ok(report);
        }

        let workers = effective_workers(self.config.workers, files.len(), available_units());
        let pool = WorkerPool::new(workers)?;
        info!(
            count = files.len(),
            workers = pool.workers(),
            move_after_copy = self.config.move_after_copy(),
            "Processing files"
        );

        let config = self.config.as_ref();
        let locks = &self.locks;
        pool.run(
            files,
            |file| process_file(&file, config, locks),
            |result| {
                report.record(&result);
                observer(&result);
            },
        );

        report.finish(started.elapsed());
        info!("{}", report.summary());
        Ok(report)
    }
}

/// Run the full pipeline for one file; never fails, errors become outcomes
fn process_file(file: &MediaFile, config: &Config, locks: &DirectoryLocks) -> JobResult {
    let _file_span =
        span!(Level::DEBUG, "process_file", path = ?file.path, kind = %file.kind).entered();

    let time = match extract_time(&file.path, file.kind) {
        Ok(time) => time,
        Err(e) => {
            warn!(path = ?file.path, error = %e, "Could not resolve capture time, using current time");
            ExtractedTime::now()
        }
    };

    let outcome = match place_file(file, &time, config, locks) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(path = ?file.path, error = %e, "Failed to process file");
            JobOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    JobResult {
        source: file.path.clone(),
        kind: file.kind,
        time,
        outcome,
    }
}

/// Resolve the destination and write the file while holding its directory lock
fn place_file(
    file: &MediaFile,
    time: &ExtractedTime,
    config: &Config,
    locks: &DirectoryLocks,
) -> Result<JobOutcome> {
    let candidate =
        build_destination_path(&config.output_dir, &file.path, &time.timestamp, file.kind)?;
    let dir = candidate
        .parent()
        .unwrap_or(config.output_dir.as_path())
        .to_path_buf();

    locks.with_lock(&dir, || {
        let decision = resolve_destination(&file.path, &candidate)?;
        let dest = decision.final_path;

        match decision.outcome {
            Outcome::SkipIdentical => {
                debug!(source = ?file.path, existing = ?dest, "Skipping identical file");
                Ok(JobOutcome::Skipped { existing: dest })
            }
            Outcome::Copy => {
                transfer(&file.path, &dest, config.operation)?;
                info!(
                    source = ?file.path,
                    destination = ?dest,
                    time_source = ?time.source,
                    timestamp = %time.timestamp,
                    "Copied file"
                );
                Ok(JobOutcome::Copied { dest })
            }
            Outcome::RenameAndCopy => {
                transfer(&file.path, &dest, config.operation)?;
                info!(
                    source = ?file.path,
                    destination = ?dest,
                    time_source = ?time.source,
                    timestamp = %time.timestamp,
                    "Copied file under numbered name"
                );
                Ok(JobOutcome::Renamed { dest })
            }
        }
    })
}
