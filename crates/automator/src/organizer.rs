use automator_core::{Category, Classifier};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoContext, Result};
use crate::progress::ProgressSink;
use crate::resolver::SourceDescriptor;
use crate::scanner::{format_size, scan_source, ScanOptions, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "category", rename_all = "lowercase")]
pub enum FileOutcome {
    Copied(Category),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEvent {
    pub relative_path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeResult {
    pub files_scanned: usize,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub events: Vec<FileEvent>,
}

impl OrganizeResult {
    pub fn files_skipped(&self) -> usize {
        self.files_scanned - self.files_copied
    }

    fn record(mut self, file: &SourceFile, outcome: FileOutcome) -> Self {
        if let FileOutcome::Copied(_) = outcome {
            self.files_copied += 1;
            self.bytes_copied += file.size;
        }
        self.events.push(FileEvent {
            relative_path: file.relative.clone(),
            outcome,
        });
        self
    }
}

/// Copies every classified file under the source into
/// `<output_root>/<category>/<basename>`.
///
/// Files sharing a basename overwrite each other, last one wins. A failed
/// copy aborts the run and leaves earlier copies in place.
pub fn organize(
    descriptor: &SourceDescriptor,
    output_root: &Path,
    classifier: &Classifier,
    sink: &dyn ProgressSink,
) -> Result<OrganizeResult> {
    std::fs::create_dir_all(output_root).at(output_root)?;

    let source = std::fs::canonicalize(&descriptor.path).at(&descriptor.path)?;
    let output = std::fs::canonicalize(output_root).at(output_root)?;

    sink.emit(&format!("Scanning source directory: {}", source.display()));
    sink.emit(&format!("Organizing files into: {}", output.display()));

    let options = ScanOptions {
        exclude: excluded_subtrees(&source, &output),
    };
    let files = scan_source(&source, &options)?;

    if files.is_empty() {
        sink.emit("No files found in the source directory.");
        return Ok(OrganizeResult::default());
    }

    let initial = OrganizeResult {
        files_scanned: files.len(),
        ..Default::default()
    };

    let result = files.iter().try_fold(initial, |acc, file| {
        let outcome = place_file(file, &output, classifier)?;
        match outcome {
            FileOutcome::Copied(category) => sink.emit(&format!(
                "Copied: {} -> {}/",
                file.relative.display(),
                category
            )),
            FileOutcome::Skipped => sink.emit(&format!("Skipped: {}", file.relative.display())),
        }
        Ok::<_, Error>(acc.record(file, outcome))
    })?;

    sink.emit(&format!(
        "Successfully organized {} of {} files ({}).",
        result.files_copied,
        result.files_scanned,
        format_size(result.bytes_copied)
    ));

    Ok(result)
}

/// Output that lives inside the source must not be scanned again, or a
/// re-run would copy files onto themselves.
fn excluded_subtrees(source: &Path, output: &Path) -> Vec<PathBuf> {
    if output == source {
        Category::ALL
            .iter()
            .filter(|c| c.is_copied())
            .map(|c| output.join(c.relative_dir()))
            .collect()
    } else if output.starts_with(source) {
        vec![output.to_path_buf()]
    } else {
        Vec::new()
    }
}

fn place_file(file: &SourceFile, output: &Path, classifier: &Classifier) -> Result<FileOutcome> {
    let category = classifier.classify(&file.path);
    if !category.is_copied() {
        tracing::debug!(file = %file.relative.display(), "skipped");
        return Ok(FileOutcome::Skipped);
    }

    let dest_dir = output.join(category.relative_dir());
    std::fs::create_dir_all(&dest_dir).at(&dest_dir)?;

    let name = file.path.file_name().unwrap_or(file.path.as_os_str());
    let dest = dest_dir.join(name);
    if is_same_file(&file.path, &dest) {
        return Err(Error::io(
            &file.path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "source and destination are the same file",
            ),
        ));
    }
    std::fs::copy(&file.path, &dest).at(&file.path)?;
    tracing::debug!(file = %file.relative.display(), %category, "copied");

    Ok(FileOutcome::Copied(category))
}

/// Copying a file onto itself truncates it, which happens when the source
/// sits inside the output tree.
fn is_same_file(path: &Path, dest: &Path) -> bool {
    std::fs::canonicalize(dest).is_ok_and(|dest| dest == path)
}
