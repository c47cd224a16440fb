/// Directory scanning, per-file classification and relocation.
///
/// An [`Archiver`] is built once per run from a merged rule table. It inverts
/// the table up front and then, for each regular file directly inside a
/// source directory, resolves a category, applies the override chain, and
/// moves the file under `destination_root/<category>`. Every decision is
/// written to the shared [`EventLog`].
use crate::event_log::EventLog;
use crate::overrides::{DEFAULT_OVERRIDES, FileRecord, OverrideRule, apply_overrides};
use crate::rules::{Category, Extension, ExtensionIndex, RuleTable};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors that can occur while relocating a single file.
#[derive(Debug)]
pub enum MoveError {
    /// File size could not be read.
    MetadataUnavailable {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to create a category directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// A file with the same name is already filed under the category.
    DestinationExists { destination: PathBuf },
    /// The move itself failed.
    FileMoveFailure {
        destination: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetadataUnavailable { path, source } => {
                write!(f, "could not read metadata of {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "could not create directory {}: {}", path.display(), source)
            }
            Self::DestinationExists { destination } => {
                write!(f, "destination {} already exists", destination.display())
            }
            Self::FileMoveFailure {
                destination,
                source,
            } => {
                write!(f, "could not move to {}: {}", destination.display(), source)
            }
        }
    }
}

impl std::error::Error for MoveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MetadataUnavailable { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::FileMoveFailure { source, .. } => Some(source),
            Self::DestinationExists { .. } => None,
        }
    }
}

/// Why a file was left where it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The filename has no extension.
    NoExtension,
    /// No category claims the extension.
    NoRule { extension: Extension },
}

/// The classification of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// File it under `category` at `destination`.
    Move {
        category: Category,
        destination: PathBuf,
    },
    /// Leave it in place.
    Skip(SkipReason),
}

/// A dry-run entry: what [`Archiver::scan`] would do with `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub decision: Decision,
}

/// A file that was relocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
}

/// A file that could not be relocated and stayed at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Terminal state of one file in a scan.
#[derive(Debug)]
pub enum FileOutcome {
    Moved(MovedFile),
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { path: PathBuf, error: MoveError },
}

/// Summary of one [`Archiver::scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Files moved into the destination tree.
    pub moved: Vec<MovedFile>,
    /// Files left in place for lack of an extension or rule.
    pub skipped: usize,
    /// Files passed over because their name is on the ignore list.
    pub ignored: usize,
    /// Files whose move failed.
    pub failed: Vec<FailedFile>,
    /// The source was not an existing directory.
    pub source_missing: bool,
    /// The source directory could not be listed.
    pub read_error: Option<String>,
}

impl ScanReport {
    /// Number of errors recorded: per-file failures plus scan-level failures.
    pub fn error_count(&self) -> usize {
        self.failed.len() + usize::from(self.source_missing) + usize::from(self.read_error.is_some())
    }

    /// Returns true if nothing went wrong.
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    /// Number of files moved into each category.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for moved in &self.moved {
            *counts.entry(moved.category.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Classifies and relocates files according to a fixed rule set.
#[derive(Debug)]
pub struct Archiver {
    index: ExtensionIndex,
    overrides: &'static [OverrideRule],
    ignore_files: HashSet<String>,
    destination_root: PathBuf,
    log: Arc<EventLog>,
}

impl Archiver {
    /// Creates an archiver, inverting `rules` once.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use archive_sorter::{Archiver, ArchiveConfig, EventLog};
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// let config = ArchiveConfig::load(Path::new("config.yaml")).expect("valid config");
    /// let log = Arc::new(EventLog::new());
    /// log.setup(Path::new("archive.log")).expect("log file");
    ///
    /// let archiver = Archiver::new(
    ///     &config.merged_rules(),
    ///     config.ignore_files.clone(),
    ///     "/home/user/DOCUMENTS",
    ///     Arc::clone(&log),
    /// );
    /// let report = archiver.scan(Path::new("/home/user/Downloads"));
    /// println!("moved {} files", report.moved.len());
    /// ```
    pub fn new<I>(
        rules: &RuleTable,
        ignore_files: I,
        destination_root: impl Into<PathBuf>,
        log: Arc<EventLog>,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let index = ExtensionIndex::from_rules(rules);
        tracing::debug!(
            categories = rules.len(),
            extensions = index.len(),
            "built extension index"
        );
        Self {
            index,
            overrides: DEFAULT_OVERRIDES,
            ignore_files: ignore_files.into_iter().collect(),
            destination_root: destination_root.into(),
            log,
        }
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// The override chain, in evaluation order.
    pub fn overrides(&self) -> &[OverrideRule] {
        self.overrides
    }

    /// Sorts every eligible file directly inside `source`.
    ///
    /// A missing source directory is logged as an error and yields a report
    /// with `source_missing` set; it is never returned as an `Err`.
    pub fn scan(&self, source: &Path) -> ScanReport {
        self.scan_with(source, |_| {})
    }

    /// Like [`Archiver::scan`], calling `observe` after each file is settled.
    pub fn scan_with<F>(&self, source: &Path, mut observe: F) -> ScanReport
    where
        F: FnMut(&FileOutcome),
    {
        let mut report = ScanReport::default();

        if !source.is_dir() {
            self.log
                .error(&format!("Source directory not found: {}", source.display()));
            report.source_missing = true;
            return report;
        }

        let files = match self.eligible_files(source, &mut report.ignored) {
            Ok(files) => files,
            Err(e) => {
                self.log.error(&format!(
                    "Could not read source directory {}: {}",
                    source.display(),
                    e
                ));
                report.read_error = Some(e.to_string());
                return report;
            }
        };

        tracing::debug!(source = %source.display(), files = files.len(), "scanning");

        for path in files {
            let outcome = self.sort_file(&path);
            match &outcome {
                FileOutcome::Moved(moved) => report.moved.push(moved.clone()),
                FileOutcome::Skipped { .. } => report.skipped += 1,
                FileOutcome::Failed { path, error } => report.failed.push(FailedFile {
                    path: path.clone(),
                    reason: error.to_string(),
                }),
            }
            observe(&outcome);
        }

        tracing::debug!(
            moved = report.moved.len(),
            skipped = report.skipped,
            ignored = report.ignored,
            failed = report.failed.len(),
            "scan finished"
        );
        report
    }

    /// Classifies every eligible file in `source` without touching the
    /// filesystem or the event log.
    ///
    /// Files whose metadata cannot be read are left out.
    pub fn preview(&self, source: &Path) -> io::Result<Vec<PlannedMove>> {
        let mut ignored = 0;
        let files = self.eligible_files(source, &mut ignored)?;

        Ok(files
            .into_iter()
            .filter_map(|path| match self.classify(&path) {
                Ok(decision) => Some(PlannedMove {
                    source: path,
                    decision,
                }),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "left out of preview");
                    None
                }
            })
            .collect())
    }

    /// Resolves the destination of a single file.
    ///
    /// Runs extension extraction, index lookup, and the override chain, in
    /// that order. Only reads file metadata once a category is resolved.
    pub fn classify(&self, path: &Path) -> Result<Decision, MoveError> {
        let Some(extension) = Extension::from_path(path) else {
            return Ok(Decision::Skip(SkipReason::NoExtension));
        };

        let Some(resolved) = self.index.lookup(&extension) else {
            return Ok(Decision::Skip(SkipReason::NoRule { extension }));
        };

        let size = fs::metadata(path)
            .map_err(|e| MoveError::MetadataUnavailable {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();

        let record = FileRecord {
            path: path.to_path_buf(),
            file_name: file_name_of(path),
            extension,
            size,
        };
        let category = apply_overrides(self.overrides, &record, resolved.clone());
        let destination = self
            .destination_root
            .join(category.relative_path())
            .join(&record.file_name);

        Ok(Decision::Move {
            category,
            destination,
        })
    }

    /// Lists regular files directly inside `source`, sorted by name, minus
    /// ignored names.
    fn eligible_files(&self, source: &Path, ignored: &mut usize) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(source)?.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            if self
                .ignore_files
                .contains(entry.file_name().to_string_lossy().as_ref())
            {
                *ignored += 1;
                continue;
            }
            files.push(entry.path());
        }

        files.sort();
        Ok(files)
    }

    /// Classifies and moves one file, logging the outcome.
    fn sort_file(&self, path: &Path) -> FileOutcome {
        let name = file_name_of(path);

        let decision = match self.classify(path) {
            Ok(decision) => decision,
            Err(error) => {
                self.log
                    .error(&format!("Failed to move {}: {}", path.display(), error));
                return FileOutcome::Failed {
                    path: path.to_path_buf(),
                    error,
                };
            }
        };

        let (category, destination) = match decision {
            Decision::Move {
                category,
                destination,
            } => (category, destination),
            Decision::Skip(reason) => {
                match &reason {
                    SkipReason::NoExtension => self
                        .log
                        .warning(&format!("File has no extension, skipping: {}", name)),
                    SkipReason::NoRule { extension } => self.log.info(&format!(
                        "No rule found for extension '{}', skipping: {}",
                        extension, name
                    )),
                }
                return FileOutcome::Skipped {
                    path: path.to_path_buf(),
                    reason,
                };
            }
        };

        match relocate(path, &destination) {
            Ok(()) => {
                self.log.info(&format!(
                    "Moved: {} -> {}",
                    path.display(),
                    destination.display()
                ));
                FileOutcome::Moved(MovedFile {
                    source: path.to_path_buf(),
                    destination,
                    category,
                })
            }
            Err(error) => {
                self.log
                    .error(&format!("Failed to move {}: {}", path.display(), error));
                FileOutcome::Failed {
                    path: path.to_path_buf(),
                    error,
                }
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Moves `source` to `destination`, creating the parent directory.
///
/// Refuses to replace an existing destination. Falls back to
/// [`copy_then_remove`] across filesystems.
fn relocate(source: &Path, destination: &Path) -> Result<(), MoveError> {
    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir).map_err(|e| MoveError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    if fs::symlink_metadata(destination).is_ok() {
        return Err(MoveError::DestinationExists {
            destination: destination.to_path_buf(),
        });
    }

    let moved = match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(source, destination),
        other => other,
    };

    moved.map_err(|e| MoveError::FileMoveFailure {
        destination: destination.to_path_buf(),
        source: e,
    })
}

/// Copies `source` to `destination` and deletes `source`.
///
/// On any failure, including a copy that stops partway, whatever was written
/// at `destination` is removed and `source` is left untouched.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)
        .and_then(|_| fs::remove_file(source))
        .inspect_err(|_| {
            let _ = fs::remove_file(destination);
        })
}
