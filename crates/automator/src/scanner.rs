use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Dotfiles are always listed; only `exclude` narrows the walk.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Subtrees skipped entirely, matched by exact path.
    pub exclude: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative: PathBuf,
    pub size: u64,
}

/// Lists every regular file under `root`, sorted by path.
///
/// The whole list is collected before returning so callers may write into
/// the tree without disturbing the walk.
pub fn scan_source(root: &Path, options: &ScanOptions) -> Result<Vec<SourceFile>> {
    let keep = |entry: &walkdir::DirEntry| -> bool {
        entry.depth() == 0 || !options.exclude.iter().any(|ex| ex == entry.path())
    };

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep)
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() => Some(source_file(root, e)),
            Ok(_) => None,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                Some(Err(Error::io(path, err.into())))
            }
        })
        .collect()
}

fn source_file(root: &Path, entry: walkdir::DirEntry) -> Result<SourceFile> {
    let size = entry
        .metadata()
        .map(|m| m.len())
        .map_err(|err| Error::io(entry.path(), err.into()))?;
    let path = entry.into_path();
    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

    Ok(SourceFile {
        path,
        relative,
        size,
    })
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (1024 * 1024 * 1024, "GB"),
        (1024 * 1024, "MB"),
        (1024, "KB"),
    ];

    UNITS
        .iter()
        .find(|(threshold, _)| bytes >= *threshold)
        .map(|(threshold, unit)| format!("{:.2} {}", bytes as f64 / *threshold as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}
