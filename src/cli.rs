//! CLI argument parsing with clap

use crate::config::{Config, FileOperation};
use clap::Parser;
use std::path::PathBuf;

/// chronosort - sort photos and videos into a date tree
///
/// Copies (or moves) every image and video under SOURCE into
/// DEST/YYYY/YYYYMMDD/, with videos in a VIDEO subfolder. Capture time comes
/// from EXIF or container metadata, falling back to the modification time.
#[derive(Parser, Debug)]
#[command(name = "chronosort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory to scan recursively
    pub source: PathBuf,

    /// Destination root for the date tree
    pub destination: PathBuf,

    /// Path to configuration file (TOML format)
    ///
    /// Settings from the file are used as defaults; CLI flags override them.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Also write log records to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (implies --log, default ./chronosort.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Delete each source file after it has been copied
    #[arg(long = "move")]
    pub move_files: bool,

    /// Number of worker threads (0 = auto)
    #[arg(short, long, env = "CHRONOSORT_WORKERS")]
    pub workers: Option<usize>,

    /// Do not ask before writing into a non-empty destination
    #[arg(short, long)]
    pub yes: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Write the log file as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        config.source_dir = self.source.clone();
        config.output_dir = self.destination.clone();

        if self.move_files {
            config.operation = FileOperation::Move;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.log {
            config.log_to_file = true;
        }
        if let Some(ref log_file) = self.log_file {
            config.log_to_file = true;
            config.log_file = Some(log_file.clone());
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
