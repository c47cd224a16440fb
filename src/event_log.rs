//! Append-only record of every classification and move decision.
//!
//! An [`EventLog`] is a handle owned by the caller and shared with the
//! archiver. The first successful [`EventLog::setup`] binds it to a file;
//! later calls keep that binding no matter which path they pass.
//!
//! Records look like:
//!
//! ```text
//! 2026-01-31 14:05:09 - INFO - Moved: /in/a.pdf -> /out/DOCUMENTS/a.pdf
//! ```
//!
//! Every record is also emitted through `tracing`, so a console subscriber
//! can mirror the log.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// Timestamp layout of a record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Routine classification, skip and move events.
    Info,
    /// Non-fatal oddities such as files without an extension.
    Warning,
    /// Scan-level or move-level failures.
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats one record line, including the trailing newline.
pub fn format_record(timestamp: &DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}\n",
        timestamp.format(TIMESTAMP_FORMAT),
        level,
        message
    )
}

struct Sink {
    path: PathBuf,
    file: Mutex<File>,
}

/// Caller-owned event log with a one-time file binding.
#[derive(Default)]
pub struct EventLog {
    sink: OnceLock<Sink>,
}

impl EventLog {
    /// Creates a handle that is not yet bound to a file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the log to `path` on first use and returns the handle.
    ///
    /// The file is opened for append and created with its parent directories
    /// if needed. Once bound, further calls return immediately and the
    /// `path` argument is ignored.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the first bind cannot open the file; the
    /// handle stays unbound in that case.
    pub fn setup(&self, path: &Path) -> io::Result<&Self> {
        if let Some(sink) = self.sink.get() {
            if sink.path != path {
                tracing::debug!(
                    bound = %sink.path.display(),
                    requested = %path.display(),
                    "event log already bound, keeping existing file"
                );
            }
            return Ok(self);
        }

        let path = std::path::absolute(path)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        // A concurrent first bind would lose this race and drop its file.
        let _ = self.sink.set(Sink {
            path,
            file: Mutex::new(file),
        });
        Ok(self)
    }

    /// Returns true once a file is bound.
    pub fn is_active(&self) -> bool {
        self.sink.get().is_some()
    }

    /// Returns the bound file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.sink.get().map(|sink| sink.path.as_path())
    }

    /// Writes one record at `level`.
    pub fn record(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!(target: "archive_sorter::events", "{}", message),
            Level::Warning => tracing::warn!(target: "archive_sorter::events", "{}", message),
            Level::Error => tracing::error!(target: "archive_sorter::events", "{}", message),
        }

        let Some(sink) = self.sink.get() else {
            return;
        };
        let line = format_record(&Local::now(), level, message);
        let result = match sink.file.lock() {
            Ok(mut file) => file.write_all(line.as_bytes()).and_then(|()| file.flush()),
            Err(_) => Err(io::Error::other("event log lock poisoned")),
        };
        if let Err(e) = result {
            tracing::warn!(path = %sink.path.display(), error = %e, "failed to write event record");
        }
    }

    pub fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.record(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog").field("path", &self.path()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_format_record() {
        let ts = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid local time");
        assert_eq!(
            format_record(&ts, Level::Warning, "File has no extension, skipping: README"),
            "2024-03-09 07:05:01 - WARNING - File has no extension, skipping: README\n"
        );
    }

    #[test]
    fn test_unbound_log_writes_nothing() {
        let log = EventLog::new();
        assert!(!log.is_active());
        assert_eq!(log.path(), None);
        log.info("goes nowhere");
    }

    #[test]
    fn test_setup_creates_file_and_appends() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("logs").join("archive.log");

        let log = EventLog::new();
        log.setup(&path).expect("Failed to set up log");
        log.info("first");
        log.error("second");

        let content = fs::read_to_string(&path).expect("Failed to read log");
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - first"));
        assert!(lines[1].ends_with(" - ERROR - second"));
    }

    #[test]
    fn test_setup_never_truncates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("archive.log");
        fs::write(&path, "earlier run\n").expect("write");

        let log = EventLog::new();
        log.setup(&path).expect("Failed to set up log");
        log.info("later run");

        let content = fs::read_to_string(&path).expect("Failed to read log");
        assert!(content.starts_with("earlier run\n"));
        assert!(content.contains("later run"));
    }

    #[test]
    fn test_second_setup_keeps_first_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let first = temp_dir.path().join("first.log");
        let second = temp_dir.path().join("second.log");

        let log = EventLog::new();
        log.setup(&first).expect("first setup");
        log.info("from first");
        log.setup(&second).expect("second setup");
        log.info("from second");

        assert_eq!(log.path(), Some(first.as_path()));
        assert!(!second.exists());

        let content = fs::read_to_string(&first).expect("Failed to read log");
        assert!(content.contains("from first"));
        assert!(content.contains("from second"));
    }
}
