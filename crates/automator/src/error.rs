use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source unavailable: {location}: {reason}")]
    SourceUnavailable {
        location: String,
        #[source]
        reason: UnavailableReason,
    },
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum UnavailableReason {
    #[error("path does not exist")]
    Missing,
    #[error("not a directory")]
    NotADirectory,
    #[error("not readable: {0}")]
    Unreadable(#[source] io::Error),
    #[error("fetch failed: {0}")]
    Transport(#[source] git2::Error),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn unavailable(location: impl Into<String>, reason: UnavailableReason) -> Self {
        Self::SourceUnavailable {
            location: location.into(),
            reason,
        }
    }

    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Attaches the offending path to a bare `io::Error`.
pub(crate) trait IoContext<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::io(path, source))
    }
}
