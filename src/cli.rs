//! Command-line interface module for archsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Console tracing setup
//! - Wiring configuration, event log and archiver together
//! - Dry-run previews and JSON reports

use crate::archiver::{Archiver, Decision, FileOutcome, ScanReport, SkipReason};
use crate::config::{ArchiveConfig, DEFAULT_CONFIG_FILE};
use crate::event_log::EventLog;
use crate::output::{OutputFormatter, plural};
use clap::Parser;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Default event log file, resolved against the working directory.
pub const DEFAULT_LOG_FILE: &str = "archive.log";

/// Sort the files of a directory into a category tree by extension.
#[derive(Parser, Debug, Clone)]
#[command(name = "archsort")]
#[command(about = "Sort the files of a directory into a category tree by extension", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, value_name = "DIR", help = "Directory to sort [default: current directory]")]
    pub source: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Destination root [default: documents_dir from the config, else ./DOCUMENTS]"
    )]
    pub docs: Option<PathBuf>,

    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE, help = "Configuration file (YAML, or TOML if it ends in .toml)")]
    pub config: PathBuf,

    #[arg(long = "log-file", value_name = "FILE", default_value = DEFAULT_LOG_FILE, help = "Event log file")]
    pub log_file: PathBuf,

    #[arg(long, help = "Show where files would go without moving anything")]
    pub dry_run: bool,

    #[arg(long, conflicts_with = "dry_run", help = "Print the scan report as JSON")]
    pub json: bool,

    #[arg(long, short = 'v', help = "Mirror event records to stderr")]
    pub verbose: bool,
}

/// Installs the console tracing subscriber.
///
/// Event records are only mirrored to stderr in verbose mode; `RUST_LOG`
/// overrides both settings.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "archive_sorter=debug"
    } else {
        "archive_sorter=warn,archive_sorter::events=off"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs the CLI application with parsed arguments.
///
/// Sets up the event log, loads configuration, builds an [`Archiver`], and
/// either sorts the source directory or previews it.
///
/// # Errors
///
/// Returns a message if the event log cannot be opened or the configuration
/// file is invalid. Problems with individual files are never errors here;
/// they are written to the event log and summarized.
///
/// # Examples
///
/// ```no_run
/// use archive_sorter::cli::{Cli, run_cli};
/// use clap::Parser;
///
/// let cli = Cli::parse_from(["archsort", "--source", "/home/user/Downloads"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let cwd = env::current_dir().map_err(|e| format!("Error reading working directory: {}", e))?;

    let log = Arc::new(EventLog::new());
    log.setup(&cli.log_file).map_err(|e| {
        format!(
            "Error opening log file {}: {}",
            cli.log_file.display(),
            e
        )
    })?;

    let config = ArchiveConfig::load(&cli.config)
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    let source = cli.source.clone().unwrap_or_else(|| cwd.clone());
    let destination_root = config.destination_root(cli.docs.as_deref(), &cwd);

    let archiver = Archiver::new(
        &config.merged_rules(),
        config.ignore_files.clone(),
        destination_root,
        Arc::clone(&log),
    );

    if cli.dry_run {
        return preview_directory(&archiver, &source);
    }

    let report = archive_directory(&archiver, &source, !cli.json);

    if cli.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {}", e))?;
        println!("{}", json);
    } else {
        print_report(&report, &source, log.path().unwrap_or(cli.log_file.as_path()));
    }

    Ok(())
}

/// Sorts `source`, showing a spinner when `show_progress` is set.
pub fn archive_directory(archiver: &Archiver, source: &Path, show_progress: bool) -> ScanReport {
    let pb = if show_progress {
        OutputFormatter::info(&format!("Sorting contents of: {}", source.display()));
        OutputFormatter::create_scan_spinner()
    } else {
        ProgressBar::hidden()
    };

    let report = archiver.scan_with(source, |outcome| {
        let path = match outcome {
            FileOutcome::Moved(moved) => &moved.source,
            FileOutcome::Skipped { path, .. } | FileOutcome::Failed { path, .. } => path,
        };
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().to_string());
        }
        pb.inc(1);
    });

    pb.finish_and_clear();
    report
}

fn print_report(report: &ScanReport, source: &Path, log_path: &Path) {
    if report.source_missing {
        OutputFormatter::error(&format!(
            "Source directory not found: {}",
            source.display()
        ));
    } else if let Some(reason) = &report.read_error {
        OutputFormatter::error(&format!(
            "Could not read {}: {}",
            source.display(),
            reason
        ));
    } else {
        OutputFormatter::summary_table(&report.category_counts(), report.moved.len());

        if report.skipped > 0 {
            OutputFormatter::warning(&format!(
                "{} {} left in place (no extension or no matching rule)",
                report.skipped,
                plural(report.skipped)
            ));
        }
        if report.ignored > 0 {
            OutputFormatter::info(&format!(
                "{} ignored {}",
                report.ignored,
                plural(report.ignored)
            ));
        }
        for failed in &report.failed {
            OutputFormatter::error(&format!("{}: {}", failed.path.display(), failed.reason));
        }
    }

    if report.is_clean() {
        OutputFormatter::success("Sorting complete.");
    } else {
        OutputFormatter::warning("Sorting finished with errors.");
    }
    OutputFormatter::info(&format!("See {} for details.", log_path.display()));
}

/// Prints what a scan of `source` would do, without moving anything.
///
/// A missing source is reported the same way a real run reports it and is
/// not an error.
fn preview_directory(archiver: &Archiver, source: &Path) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", source.display()));

    if !source.is_dir() {
        OutputFormatter::error(&format!(
            "Source directory not found: {}",
            source.display()
        ));
        return Ok(());
    }

    OutputFormatter::info(&format!(
        "Destination root: {}",
        archiver.destination_root().display()
    ));

    let plan = archiver
        .preview(source)
        .map_err(|e| format!("Error reading directory {}: {}", source.display(), e))?;

    if plan.is_empty() {
        OutputFormatter::info("No files found to sort.");
        return Ok(());
    }

    let mut category_counts: HashMap<String, usize> = HashMap::new();
    let mut planned = 0;

    for entry in &plan {
        let name = entry
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match &entry.decision {
            Decision::Move {
                category,
                destination,
            } => {
                println!(" - {}", name);
                println!("   → Would move to {}", destination.display());
                *category_counts.entry(category.to_string()).or_insert(0) += 1;
                planned += 1;
            }
            Decision::Skip(SkipReason::NoExtension) => {
                println!(" - {}", name);
                println!("   · Would skip (no extension)");
            }
            Decision::Skip(SkipReason::NoRule { extension }) => {
                println!(" - {}", name);
                println!("   · Would skip (no rule for '{}')", extension);
            }
        }
    }

    OutputFormatter::summary_table(&category_counts, planned);
    OutputFormatter::dry_run_notice("No files were moved.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["archsort"]);

        assert_eq!(cli.source, None);
        assert_eq!(cli.docs, None);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.log_file, PathBuf::from("archive.log"));
        assert!(!cli.dry_run);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::parse_from([
            "archsort",
            "--source",
            "in",
            "--docs",
            "out",
            "--config",
            "rules.toml",
            "--log-file",
            "run.log",
            "--dry-run",
            "-v",
        ]);

        assert_eq!(cli.source, Some(PathBuf::from("in")));
        assert_eq!(cli.docs, Some(PathBuf::from("out")));
        assert_eq!(cli.config, PathBuf::from("rules.toml"));
        assert_eq!(cli.log_file, PathBuf::from("run.log"));
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_json_conflicts_with_dry_run() {
        let result = Cli::try_parse_from(["archsort", "--dry-run", "--json"]);
        assert!(result.is_err());
    }
}
