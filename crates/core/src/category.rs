use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Destination bucket a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Videos,
    Documents,
    #[serde(rename = "documents/pdf")]
    DocumentsPdf,
    Spreadsheets,
    Cad,
    Archives,
    Others,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Images,
        Self::Videos,
        Self::Documents,
        Self::DocumentsPdf,
        Self::Spreadsheets,
        Self::Cad,
        Self::Archives,
        Self::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Documents => "documents",
            Self::DocumentsPdf => "documents/pdf",
            Self::Spreadsheets => "spreadsheets",
            Self::Cad => "cad",
            Self::Archives => "archives",
            Self::Others => "others",
        }
    }

    /// Directory under the output root, built from path components so
    /// `documents/pdf` nests correctly on every platform.
    pub fn relative_dir(&self) -> PathBuf {
        self.as_str().split('/').collect()
    }

    pub fn is_copied(&self) -> bool {
        !matches!(self, Self::Others)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("empty extension listed under {0}")]
    EmptyExtension(Category),
    #[error("{0} is the fallback category and cannot list extensions")]
    FallbackCategory(Category),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub category: Category,
    pub extensions: Vec<String>,
}

/// Ordered mapping from category to lowercase, dot-prefixed extensions.
///
/// Lookup walks entries in order and the first match wins, so an extension
/// listed under two categories always resolves to the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TableEntry>", into = "Vec<TableEntry>")]
pub struct ExtensionTable {
    entries: Vec<TableEntry>,
}

impl ExtensionTable {
    pub fn new(entries: Vec<TableEntry>) -> Result<Self, TableError> {
        entries
            .into_iter()
            .map(normalize_entry)
            .collect::<Result<Vec<_>, _>>()
            .map(|entries| Self { entries })
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    /// `ext` must already be lowercase with its leading dot.
    pub fn lookup(&self, ext: &str) -> Option<Category> {
        self.entries
            .iter()
            .find(|entry| entry.extensions.iter().any(|e| e == ext))
            .map(|entry| entry.category)
    }

    /// Extensions listed more than once, in the order their repeats appear.
    pub fn duplicates(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .flat_map(|entry| entry.extensions.iter())
            .filter(|ext| !seen.insert(ext.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        let defaults: &[(Category, &[&str])] = &[
            (
                Category::Images,
                &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".tiff"],
            ),
            (Category::Videos, &[".mp4", ".mov", ".avi", ".mkv", ".webm"]),
            (Category::Documents, &[".pdf", ".doc", ".docx", ".txt"]),
            (Category::Spreadsheets, &[".xls", ".xlsx", ".csv"]),
            (Category::Cad, &[".dwg", ".dxf"]),
            (Category::Archives, &[".zip", ".rar", ".7z", ".tar", ".gz"]),
        ];

        let entries = defaults
            .iter()
            .map(|(category, exts)| TableEntry {
                category: *category,
                extensions: exts.iter().map(|e| e.to_string()).collect(),
            })
            .collect();

        Self { entries }
    }
}

impl TryFrom<Vec<TableEntry>> for ExtensionTable {
    type Error = TableError;

    fn try_from(entries: Vec<TableEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<ExtensionTable> for Vec<TableEntry> {
    fn from(table: ExtensionTable) -> Self {
        table.entries
    }
}

fn normalize_entry(entry: TableEntry) -> Result<TableEntry, TableError> {
    if entry.category == Category::Others && !entry.extensions.is_empty() {
        return Err(TableError::FallbackCategory(entry.category));
    }

    let extensions = entry
        .extensions
        .iter()
        .map(|ext| normalize_extension(ext).ok_or(TableError::EmptyExtension(entry.category)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TableEntry {
        category: entry.category,
        extensions,
    })
}

/// "PNG", ".PNG" and " png " all become ".png".
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    (!trimmed.is_empty()).then(|| format!(".{}", trimmed.to_lowercase()))
}
