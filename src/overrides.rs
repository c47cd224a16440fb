//! Extension-specific exceptions applied after the rule table lookup.
//!
//! Each [`OverrideRule`] is a pure function of the file being classified and
//! the category resolved so far. Rules run in a fixed order and a later rule
//! sees the result of an earlier one.

use crate::rules::{Category, Extension};
use std::path::PathBuf;

/// Files strictly smaller than this are treated as short admin scripts.
pub const SMALL_SCRIPT_BYTES: u64 = 5 * 1024;

/// Lowercase substring that marks an `.iso` image as an installer.
pub const INSTALLER_MARKER: &str = "install";

const SYSTEM_ADMIN: &str = "SYSTEM_ADMIN";
const DATA: &str = "DATA";
const VIDEO: &str = "VIDEO";

/// What the archiver knows about a file while classifying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    pub extension: Extension,
    pub size: u64,
}

/// A fixed exception keyed by extension.
///
/// `apply` returns `Some(category)` to rewrite the resolved category and
/// `None` to leave it unchanged.
#[derive(Clone, Copy)]
pub struct OverrideRule {
    pub name: &'static str,
    pub extension: &'static str,
    pub apply: fn(&FileRecord, &Category) -> Option<Category>,
}

impl OverrideRule {
    /// Returns the rewritten category if this rule matches `record`.
    pub fn evaluate(&self, record: &FileRecord, current: &Category) -> Option<Category> {
        if record.extension.as_str() != self.extension {
            return None;
        }
        (self.apply)(record, current)
    }
}

impl std::fmt::Debug for OverrideRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideRule")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .finish()
    }
}

fn iso_image(record: &FileRecord, _current: &Category) -> Option<Category> {
    if record.file_name.to_lowercase().contains(INSTALLER_MARKER) {
        Some(Category::new(SYSTEM_ADMIN))
    } else {
        Some(Category::new(DATA))
    }
}

fn webm_video(_record: &FileRecord, _current: &Category) -> Option<Category> {
    Some(Category::new(VIDEO))
}

fn small_python_script(record: &FileRecord, _current: &Category) -> Option<Category> {
    (record.size < SMALL_SCRIPT_BYTES).then(|| Category::new(SYSTEM_ADMIN))
}

/// The override chain in evaluation order.
pub const DEFAULT_OVERRIDES: &[OverrideRule] = &[
    OverrideRule {
        name: "iso-installer-or-data",
        extension: ".iso",
        apply: iso_image,
    },
    OverrideRule {
        name: "webm-is-video",
        extension: ".webm",
        apply: webm_video,
    },
    OverrideRule {
        name: "small-python-script",
        extension: ".py",
        apply: small_python_script,
    },
];

/// Runs `rules` in order over an already resolved category.
pub fn apply_overrides(rules: &[OverrideRule], record: &FileRecord, resolved: Category) -> Category {
    rules.iter().fold(resolved, |current, rule| {
        match rule.evaluate(record, &current) {
            Some(rewritten) => {
                tracing::debug!(
                    path = %record.path.display(),
                    rule = rule.name,
                    from = %current,
                    to = %rewritten,
                    "override applied"
                );
                rewritten
            }
            None => current,
        }
    })
}
