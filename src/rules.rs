/// Classification rules: categories, extensions, and the lookup index between them.
///
/// A [`RuleTable`] is the forward form (category → extensions) that users edit.
/// An [`ExtensionIndex`] is the inverted form (extension → category) the archiver
/// consults for every file.
///
/// # Examples
///
/// ```
/// use archive_sorter::rules::{Category, Extension, ExtensionIndex, RuleTable};
///
/// let index = ExtensionIndex::from_rules(&RuleTable::default());
/// assert_eq!(index.lookup(&Extension::new("PDF")), Some(&Category::new("DOCUMENTS")));
/// assert_eq!(index.lookup(&Extension::new(".iso")), Some(&Category::new("SYSTEM_ADMIN")));
/// ```
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The built-in rule table, in the order it is inverted.
pub const DEFAULT_RULES: &[(&str, &[&str])] = &[
    ("DOCUMENTS", &[".pdf", ".doc", ".docx", ".txt", ".odt"]),
    ("DOCUMENTS/PRESENTATIONS", &[".ppt", ".pptx", ".key"]),
    ("DOCUMENTS/SPREADSHEETS", &[".xls", ".xlsx", ".csv"]),
    ("DOCUMENTS/BOOKS", &[".epub"]),
    ("AUDIO", &[".mp3", ".wav", ".aac"]),
    ("AUDIO/MUSIC", &[".flac"]),
    ("AUDIO/PODCAST", &[".ogg"]),
    ("PHOTOS", &[".jpg", ".jpeg", ".png", ".gif", ".tiff", ".bmp"]),
    ("VIDEO", &[".mp4", ".mkv", ".mov", ".avi", ".webm"]),
    ("DATA", &[".json", ".iso"]),
    ("SYSTEM_ADMIN", &[".py", ".sh", ".iso"]),
    ("ARCHIVES", &[".zip", ".tar", ".gz", ".rar", ".7z"]),
];

/// A destination label such as `PHOTOS` or `AUDIO/MUSIC`.
///
/// A `/` in the label denotes a nested subdirectory under the destination root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the directory path for this category, relative to the destination root.
    ///
    /// # Examples
    ///
    /// ```
    /// use archive_sorter::rules::Category;
    /// use std::path::PathBuf;
    ///
    /// let path = Category::new("AUDIO/MUSIC").relative_path();
    /// assert_eq!(path, PathBuf::from("AUDIO").join("MUSIC"));
    /// ```
    pub fn relative_path(&self) -> PathBuf {
        self.0.split('/').filter(|segment| !segment.is_empty()).collect()
    }

    /// Checks that the label stays inside the destination root.
    ///
    /// Rejects empty labels, absolute labels, empty segments and `.`/`..` segments.
    pub fn validate(&self) -> Result<(), String> {
        if self.0.trim().is_empty() {
            return Err("category name is empty".to_string());
        }
        if self.0.starts_with('/') || Path::new(&self.0).is_absolute() {
            return Err("category must be a relative path".to_string());
        }
        for segment in self.0.split('/') {
            match segment {
                "" => return Err("category contains an empty path segment".to_string()),
                "." | ".." => {
                    return Err(format!("category may not contain '{}' segments", segment));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lowercase file extension including its leading dot, e.g. `.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Extension(String);

impl Extension {
    /// Normalizes `raw` into an extension: trimmed, lowercased, dot-prefixed.
    ///
    /// ```
    /// use archive_sorter::rules::Extension;
    ///
    /// assert_eq!(Extension::new("PDF").as_str(), ".pdf");
    /// assert_eq!(Extension::new(" .Tar ").as_str(), ".tar");
    /// ```
    pub fn new(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.starts_with('.') {
            Self(lower)
        } else {
            Self(format!(".{}", lower))
        }
    }

    /// Extracts the extension of a path: the text after the final `.` of the
    /// file name.
    ///
    /// Only the case is folded; surrounding whitespace is part of the
    /// extension, so `doc.pdf ` has the extension `.pdf `. Returns `None` for
    /// names without a dot, dotfiles such as `.bashrc`, and names ending in a
    /// bare dot.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy();
        if ext.is_empty() {
            return None;
        }
        Some(Self(format!(".{}", ext.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Extension {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<Extension> for String {
    fn from(ext: Extension) -> Self {
        ext.0
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered mapping from category to the extensions filed under it.
///
/// Order matters: when two categories claim the same extension, the one that
/// comes later wins in the [`ExtensionIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    entries: Vec<(Category, Vec<Extension>)>,
}

impl RuleTable {
    /// Creates a table with no categories.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates the built-in table from [`DEFAULT_RULES`].
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (category, extensions) in DEFAULT_RULES {
            table.set(
                Category::new(*category),
                extensions.iter().map(|ext| Extension::new(ext)).collect(),
            );
        }
        table
    }

    /// Sets the extension list of a category.
    ///
    /// An existing category keeps its position and has its list replaced
    /// wholesale; a new category is appended.
    pub fn set(&mut self, category: Category, extensions: Vec<Extension>) {
        match self.entries.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = extensions,
            None => self.entries.push((category, extensions)),
        }
    }

    /// Overlays every entry of `other` onto this table with [`RuleTable::set`].
    pub fn overlay(&mut self, other: &RuleTable) {
        for (category, extensions) in other.iter() {
            self.set(category.clone(), extensions.to_vec());
        }
    }

    /// Returns the extensions of a category, if present.
    pub fn get(&self, category: &Category) -> Option<&[Extension]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, extensions)| extensions.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[Extension])> {
        self.entries
            .iter()
            .map(|(category, extensions)| (category, extensions.as_slice()))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter().map(|(category, _)| category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'de> Deserialize<'de> for RuleTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RuleTableVisitor;

        impl<'de> Visitor<'de> for RuleTableVisitor {
            type Value = RuleTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of category names to lists of extensions")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RuleTable, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut table = RuleTable::empty();
                while let Some((category, extensions)) =
                    map.next_entry::<Category, Vec<Extension>>()?
                {
                    table.set(category, extensions);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(RuleTableVisitor)
    }
}

/// Extension → category lookup derived from a [`RuleTable`].
///
/// Built once and never modified; an archiver holds one for its whole lifetime.
#[derive(Debug, Clone)]
pub struct ExtensionIndex {
    map: HashMap<Extension, Category>,
}

impl ExtensionIndex {
    /// Inverts a rule table.
    ///
    /// Categories are visited in table order and extensions in list order, so
    /// an extension claimed by several categories maps to the last one.
    pub fn from_rules(rules: &RuleTable) -> Self {
        let mut map = HashMap::new();
        for (category, extensions) in rules.iter() {
            for ext in extensions {
                map.insert(Extension::new(ext.as_str()), category.clone());
            }
        }
        Self { map }
    }

    pub fn lookup(&self, extension: &Extension) -> Option<&Category> {
        self.map.get(extension)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
