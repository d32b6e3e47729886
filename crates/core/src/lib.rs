pub mod category;
pub mod classifier;

pub use category::{normalize_extension, Category, ExtensionTable, TableEntry, TableError};
pub use classifier::{classify_file, Classifier, PDF_EXTENSION};
