pub mod config;
pub mod error;
pub mod lifecycle;
pub mod organizer;
pub mod progress;
pub mod resolver;
pub mod scanner;

pub use automator_core::{
    classify_file, Category, Classifier, ExtensionTable, TableEntry, PDF_EXTENSION,
};
pub use config::{Config, DEFAULT_OUTPUT_DIR};
pub use error::{Error, Result, UnavailableReason};
pub use lifecycle::{run, run_with, RunRequest, TempCheckout};
pub use organizer::{organize, FileEvent, FileOutcome, OrganizeResult};
pub use progress::{MemorySink, NullSink, ProgressSink};
pub use resolver::{is_remote, resolve, FetchPhase, Fetcher, GitFetcher, SourceDescriptor};
pub use scanner::{format_size, scan_source, ScanOptions, SourceFile};
