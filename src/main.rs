//! chronosort - sort photos and videos into a date tree
//!
//! Copies or moves media files from a source tree into
//! `<dest>/YYYY/YYYYMMDD/[VIDEO/]` by capture time.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use chronosort::destination::inspect_output_dir;
use chronosort::{Cli, Config, OutputDirState, Processor, RunReport};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

mod cli_output {
    //! Colored console output for the run summary

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let padding = 60usize.saturating_sub(title.len()) / 2;
        let _ = stdout().execute(Print(" ".repeat(padding)));
        let _ = stdout().execute(Print(style(title).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{msg}\n")));
    }

    pub fn print_stat(key: &str, value: &str, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print one line of a detail list
    pub fn print_result(icon: &str, color: Color, source: &str, detail: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(icon).with(color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(detail).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print(style("  Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{path}\n")));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Hidden until the run starts; console log lines clear it while it draws
    let progress_bar = ProgressBar::hidden();
    let _guard = setup_logging(&cli, &config, &progress_bar)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started = %Local::now().to_rfc3339(),
        command = ?std::env::args().collect::<Vec<_>>(),
        "chronosort starting"
    );
    info!(
        source = %config.source_dir.display(),
        destination = %config.output_dir.display(),
        operation = ?config.operation,
        "Run configuration"
    );
    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    confirm_destination(&config.output_dir, cli.yes)?;

    let processor = Processor::new(config);
    let files = processor
        .collect_files()
        .context("Failed to scan source directory")?;

    progress_bar.set_length(files.len() as u64);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    progress_bar.set_draw_target(ProgressDrawTarget::stderr());

    let report = processor.process_files(files, |result| {
        progress_bar.inc(1);
        if let Some(name) = result.source.file_name() {
            progress_bar.set_message(name.to_string_lossy().into_owned());
        }
    });
    progress_bar.finish_and_clear();

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Processing failed");
            return Err(e.into());
        }
    };

    print_summary(&report);
    for line in report.summary_lines() {
        info!("{line}");
    }

    if processor.config().log_to_file {
        cli_output::print_log_path(&processor.config().get_log_file().display().to_string());
    }

    // Per-file failures are listed in the summary and do not change the exit status
    Ok(())
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref path) => {
            let file_config = Config::load_from_file(path)?;
            cli.merge_with_config(file_config)
        }
        None => cli.to_config(),
    };
    Ok(config)
}

/// Create the destination if needed and ask before writing into a non-empty one
fn confirm_destination(output_dir: &Path, assume_yes: bool) -> Result<()> {
    match inspect_output_dir(output_dir)? {
        OutputDirState::Created => info!(path = %output_dir.display(), "Created destination"),
        OutputDirState::Empty => {}
        OutputDirState::NonEmpty if assume_yes => {
            info!(path = %output_dir.display(), "Destination is not empty, continuing (--yes)");
        }
        OutputDirState::NonEmpty => {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Destination {} is not empty. Continue?",
                    output_dir.display()
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                info!("User declined non-empty destination");
                anyhow::bail!("Aborted: destination {} is not empty", output_dir.display());
            }
        }
    }
    Ok(())
}

/// Setup logging: warnings on stderr, plus an optional log file
fn setup_logging(
    cli: &Cli,
    config: &Config,
    progress_bar: &ProgressBar,
) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let console_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let mut guard = None;
    let file_layer: Option<Box<dyn Layer<Registry> + Send + Sync>> = if config.log_to_file {
        let log_path = config.get_log_file();
        if let Some(parent) = log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file);
        guard = Some(file_guard);

        let env_filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        Some(if cli.json_log {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed()
        })
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(SuspendBar {
                    bar: progress_bar.clone(),
                    inner: io::stderr,
                })
                .with_filter(console_level),
        )
        .init();

    Ok(guard)
}

/// Console writer that hides the progress bar while a log line is written
struct SuspendBar<M> {
    bar: ProgressBar,
    inner: M,
}

struct SuspendBarWriter<W> {
    bar: ProgressBar,
    inner: W,
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for SuspendBar<M> {
    type Writer = SuspendBarWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendBarWriter {
            bar: self.bar.clone(),
            inner: self.inner.make_writer(),
        }
    }
}

impl<W: Write> Write for SuspendBarWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn print_summary(report: &RunReport) {
    use cli_output::*;

    print_separator();
    print_title("Processing complete");
    print_separator();

    print_blank();
    print_stat("Processed", &report.processed.to_string(), CliTheme::ACCENT);
    print_stat("Copied", &report.copied.to_string(), CliTheme::SUCCESS);
    print_stat("Renamed", &report.renamed.len().to_string(), CliTheme::ACCENT);
    print_stat("Skipped", &report.skipped.len().to_string(), CliTheme::WARNING);
    print_stat("Failed", &report.errors.len().to_string(), CliTheme::ERROR);
    print_stat(
        "Elapsed",
        &format!("{:.2}s", report.elapsed.as_secs_f64()),
        CliTheme::HINT,
    );
    print_blank();

    if !report.renamed.is_empty() {
        print_separator();
        print_hint("Renamed files");
        for (source, dest) in &report.renamed {
            print_result(
                "↳",
                CliTheme::ACCENT,
                &source.display().to_string(),
                &format!("-> {}", dest.display()),
            );
        }
    }

    if !report.skipped.is_empty() {
        print_separator();
        print_hint("Skipped identical files");
        for source in &report.skipped {
            print_result("⊘", CliTheme::WARNING, &source.display().to_string(), "");
        }
    }

    if report.has_errors() {
        print_separator();
        print_hint("Failed files");
        for (source, cause) in &report.errors {
            print_result("✗", CliTheme::ERROR, &source.display().to_string(), cause);
        }
    }

    print_separator();
}
