use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, RemoteCallbacks};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoContext, Result, UnavailableReason};
use crate::progress::ProgressSink;

/// Concrete directory an organize run reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub path: PathBuf,
    pub is_temporary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Receiving,
    Resolving,
    Checkout,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Receiving => "receiving",
            Self::Resolving => "resolving",
            Self::Checkout => "checkout",
        })
    }
}

pub fn fetch_progress_line(phase: FetchPhase, percent: u32) -> String {
    format!("git.clone {} stage {}% complete", phase, percent)
}

/// Retrieves the latest snapshot of a remote repository into `dest`.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path, sink: &dyn ProgressSink) -> Result<(), git2::Error>;
}

/// Shallow clone through libgit2; credentials come from the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, url: &str, dest: &Path, sink: &dyn ProgressSink) -> Result<(), git2::Error> {
        let mut receiving = PercentTracker::new(FetchPhase::Receiving);
        let mut resolving = PercentTracker::new(FetchPhase::Resolving);
        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|stats| {
            receiving.update(stats.received_objects(), stats.total_objects(), sink);
            if stats.received_objects() == stats.total_objects() {
                resolving.update(stats.indexed_deltas(), stats.total_deltas(), sink);
            }
            true
        });

        let mut fetch_options = FetchOptions::new();
        fetch_options.depth(1).remote_callbacks(callbacks);

        let mut checking_out = PercentTracker::new(FetchPhase::Checkout);
        let mut checkout = CheckoutBuilder::new();
        checkout.progress(|_path, current, total| checking_out.update(current, total, sink));

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options).with_checkout(checkout);
        builder.clone(url, dest)?;
        Ok(())
    }
}

/// Emits a progress line each time a phase crosses into a new percent.
struct PercentTracker {
    phase: FetchPhase,
    last: Option<u32>,
}

impl PercentTracker {
    fn new(phase: FetchPhase) -> Self {
        Self { phase, last: None }
    }

    fn update(&mut self, current: usize, total: usize, sink: &dyn ProgressSink) {
        if total == 0 {
            return;
        }
        let percent = ((current.min(total) * 100) / total) as u32;
        if self.last != Some(percent) {
            self.last = Some(percent);
            sink.emit(&fetch_progress_line(self.phase, percent));
        }
    }
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Turns a user-supplied source into a readable directory.
///
/// Remote references are cloned into `temp_root`, which is wiped first in
/// case an earlier run left it behind. Local paths are made absolute and
/// checked, and `temp_root` is left untouched.
pub fn resolve(
    source: &str,
    temp_root: &Path,
    fetcher: &dyn Fetcher,
    sink: &dyn ProgressSink,
) -> Result<SourceDescriptor> {
    if is_remote(source) {
        resolve_remote(source, temp_root, fetcher, sink)
    } else {
        resolve_local(Path::new(source))
    }
}

fn resolve_remote(
    url: &str,
    temp_root: &Path,
    fetcher: &dyn Fetcher,
    sink: &dyn ProgressSink,
) -> Result<SourceDescriptor> {
    sink.emit(&format!(
        "Source is a URL. Cloning {} into {}...",
        url,
        temp_root.display()
    ));

    if temp_root.exists() {
        std::fs::remove_dir_all(temp_root).at(temp_root)?;
    }
    std::fs::create_dir_all(temp_root).at(temp_root)?;

    tracing::info!(url, dest = %temp_root.display(), "shallow clone");
    fetcher
        .fetch(url, temp_root, sink)
        .map_err(|e| Error::unavailable(url, UnavailableReason::Transport(e)))?;
    sink.emit("Repository cloned successfully.");

    Ok(SourceDescriptor {
        path: temp_root.to_path_buf(),
        is_temporary: true,
    })
}

fn resolve_local(path: &Path) -> Result<SourceDescriptor> {
    let location = path.display().to_string();
    let resolved = std::fs::canonicalize(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::unavailable(&location, UnavailableReason::Missing),
        _ => Error::unavailable(&location, UnavailableReason::Unreadable(e)),
    })?;

    if !resolved.is_dir() {
        return Err(Error::unavailable(
            resolved.display().to_string(),
            UnavailableReason::NotADirectory,
        ));
    }

    std::fs::read_dir(&resolved).map_err(|e| {
        Error::unavailable(
            resolved.display().to_string(),
            UnavailableReason::Unreadable(e),
        )
    })?;

    Ok(SourceDescriptor {
        path: resolved,
        is_temporary: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{MemorySink, NullSink};
    use std::fs;
    use tempfile::TempDir;

    struct WritesFiles;

    impl Fetcher for WritesFiles {
        fn fetch(
            &self,
            _url: &str,
            dest: &Path,
            sink: &dyn ProgressSink,
        ) -> Result<(), git2::Error> {
            sink.emit(&fetch_progress_line(FetchPhase::Receiving, 100));
            fs::write(dest.join("logo.png"), b"png").map_err(|e| git2::Error::from_str(&e.to_string()))
        }
    }

    struct Refuses;

    impl Fetcher for Refuses {
        fn fetch(&self, _: &str, _: &Path, _: &dyn ProgressSink) -> Result<(), git2::Error> {
            Err(git2::Error::from_str("connection refused"))
        }
    }

    #[test]
    fn detects_remote_prefixes() {
        assert!(is_remote("https://github.com/user/repo"));
        assert!(is_remote("http://example.com/repo.git"));
        assert!(!is_remote("./local/dir"));
        assert!(!is_remote("git@github.com:user/repo.git"));
        assert!(!is_remote("HTTPS-notes"));
    }

    #[test]
    fn local_source_resolves_to_absolute_dir() {
        let dir = TempDir::new().unwrap();
        let temp_root = dir.path().join("checkout");

        let descriptor = resolve(
            dir.path().to_str().unwrap(),
            &temp_root,
            &Refuses,
            &NullSink,
        )
        .unwrap();

        assert!(descriptor.path.is_absolute());
        assert!(!descriptor.is_temporary);
        assert!(!temp_root.exists());
    }

    #[test]
    fn missing_local_source_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = resolve(
            missing.to_str().unwrap(),
            &dir.path().join("tmp"),
            &Refuses,
            &NullSink,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::SourceUnavailable {
                reason: UnavailableReason::Missing,
                ..
            }
        ));
    }

    #[test]
    fn file_source_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.png");
        fs::write(&file, b"png").unwrap();

        let err = resolve(file.to_str().unwrap(), dir.path(), &Refuses, &NullSink).unwrap_err();

        assert!(matches!(
            err,
            Error::SourceUnavailable {
                reason: UnavailableReason::NotADirectory,
                ..
            }
        ));
    }

    #[test]
    fn remote_source_replaces_stale_checkout() {
        let dir = TempDir::new().unwrap();
        let temp_root = dir.path().join("checkout");
        fs::create_dir_all(&temp_root).unwrap();
        fs::write(temp_root.join("stale.txt"), b"old").unwrap();

        let sink = MemorySink::new();
        let descriptor = resolve("https://example.com/repo.git", &temp_root, &WritesFiles, &sink)
            .unwrap();

        assert!(descriptor.is_temporary);
        assert_eq!(descriptor.path, temp_root);
        assert!(temp_root.join("logo.png").exists());
        assert!(!temp_root.join("stale.txt").exists());
        assert!(sink.contains("Cloning https://example.com/repo.git"));
        assert!(sink.contains("git.clone receiving stage 100% complete"));
        assert!(sink.contains("Repository cloned successfully."));
    }

    #[test]
    fn fetch_failure_is_unavailable_with_transport_cause() {
        let dir = TempDir::new().unwrap();

        let err = resolve(
            "https://example.com/repo.git",
            &dir.path().join("checkout"),
            &Refuses,
            &NullSink,
        )
        .unwrap_err();

        match err {
            Error::SourceUnavailable {
                location,
                reason: UnavailableReason::Transport(cause),
            } => {
                assert_eq!(location, "https://example.com/repo.git");
                assert_eq!(cause.message(), "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn percent_tracker_skips_repeats() {
        let sink = MemorySink::new();
        let mut tracker = PercentTracker::new(FetchPhase::Checkout);

        tracker.update(1, 3, &sink);
        tracker.update(1, 3, &sink);
        tracker.update(3, 3, &sink);
        tracker.update(0, 0, &sink);

        assert_eq!(
            sink.lines(),
            vec![
                "git.clone checkout stage 33% complete",
                "git.clone checkout stage 100% complete",
            ]
        );
    }
}
