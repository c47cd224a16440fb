//! archive-sorter - sort a directory's files into a category tree
//!
//! This library classifies files by extension using an ordered rule table,
//! applies a small chain of extension-specific overrides, and moves each file
//! under a destination root while writing every decision to an event log.
//! Rules and ignore lists come from an optional YAML or TOML configuration.

pub mod archiver;
pub mod cli;
pub mod config;
pub mod event_log;
pub mod output;
pub mod overrides;
pub mod rules;

pub use archiver::{Archiver, Decision, FileOutcome, MoveError, PlannedMove, ScanReport, SkipReason};
pub use config::{ArchiveConfig, ConfigError};
pub use event_log::{EventLog, Level};
pub use overrides::{DEFAULT_OVERRIDES, FileRecord, OverrideRule};
pub use rules::{Category, Extension, ExtensionIndex, RuleTable};

pub use cli::{Cli, run_cli};
