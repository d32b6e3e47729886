use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::Config;
use crate::error::{IoContext, Result};
use crate::organizer::{organize, OrganizeResult};
use crate::progress::ProgressSink;
use crate::resolver::{is_remote, resolve, Fetcher, GitFetcher};

const CHECKOUT_PREFIX: &str = ".tmp-repo-";

/// Per-run checkout directory with a unique name under the configured
/// temp dir. Dropping it removes the directory, so even a panic between
/// resolve and organize leaves nothing behind.
#[derive(Debug)]
pub struct TempCheckout {
    dir: TempDir,
}

impl TempCheckout {
    pub fn allocate(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent).at(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(CHECKOUT_PREFIX)
            .tempdir_in(parent)
            .at(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the checkout, reporting but never returning a failure.
    pub fn release(self, sink: &dyn ProgressSink) {
        let path = self.path().to_path_buf();
        if !path.exists() {
            return;
        }

        sink.emit("Cleaning up temporary repository directory...");
        match self.dir.close() {
            Ok(()) => sink.emit("Temporary repository directory cleaned up."),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "checkout cleanup failed");
                sink.emit(&format!(
                    "Failed to remove temporary repository directory {}: {}",
                    path.display(),
                    err
                ));
            }
        }
    }
}

/// Inputs for one organize run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: String,
    pub output: PathBuf,
}

impl RunRequest {
    pub fn new(source: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
        }
    }
}

pub fn run(request: &RunRequest, config: &Config, sink: &dyn ProgressSink) -> Result<OrganizeResult> {
    run_with(request, config, &GitFetcher, sink)
}

/// Resolves then organizes, removing any checkout on every exit path.
///
/// The checkout is only allocated for remote sources; cleanup problems are
/// reported through `sink` and never replace the run's own outcome.
pub fn run_with(
    request: &RunRequest,
    config: &Config,
    fetcher: &dyn Fetcher,
    sink: &dyn ProgressSink,
) -> Result<OrganizeResult> {
    let checkout = is_remote(&request.source)
        .then(|| TempCheckout::allocate(&config.temp_dir))
        .transpose()?;

    let temp_root = checkout
        .as_ref()
        .map(|c| c.path().to_path_buf())
        .unwrap_or_else(|| config.temp_dir.clone());

    let classifier = config.classifier();
    let outcome = resolve(&request.source, &temp_root, fetcher, sink)
        .and_then(|descriptor| organize(&descriptor, &request.output, &classifier, sink));

    if let Some(checkout) = checkout {
        checkout.release(sink);
    }

    outcome
}
