use std::path::Path;

use crate::category::{Category, ExtensionTable};

/// Checked ahead of the table, so a table entry for it never matches.
pub const PDF_EXTENSION: &str = ".pdf";

/// Routes paths to categories by extension alone; file contents are never read.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: ExtensionTable,
}

impl Classifier {
    pub fn new(table: ExtensionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ExtensionTable {
        &self.table
    }

    pub fn classify(&self, path: &Path) -> Category {
        classify_file(path, &self.table)
    }
}

/// PDFs always land in `documents/pdf`, ahead of any table entry.
pub fn classify_file(path: &Path, table: &ExtensionTable) -> Category {
    let Some(ext) = extension_of(path) else {
        return Category::Others;
    };

    if ext == PDF_EXTENSION {
        return Category::DocumentsPdf;
    }

    table.lookup(&ext).unwrap_or(Category::Others)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
