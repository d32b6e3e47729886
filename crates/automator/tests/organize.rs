use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use project_automator::{run, Config, Error, MemorySink, NullSink, RunRequest};

fn create_project_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.png"), b"png").unwrap();
    fs::write(dir.path().join("b.PDF"), b"pdf").unwrap();
    fs::write(dir.path().join("c.unknown"), b"?").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/d.docx"), b"docx").unwrap();
    dir
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_project-automator"))
}

fn source_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Library
// ============================================================================

#[test]
fn organizes_local_project() {
    let source = create_project_dir();
    let out = TempDir::new().unwrap();
    let request = RunRequest::new(source_arg(source.path()), out.path());

    let result = run(&request, &Config::default(), &NullSink).unwrap();

    assert_eq!(result.files_scanned, 4);
    assert_eq!(result.files_copied, 3);
    assert!(out.path().join("images/a.png").exists());
    assert!(out.path().join("documents/pdf/b.PDF").exists());
    assert!(out.path().join("documents/d.docx").exists());
    assert!(!out.path().join("others").exists());
}

#[test]
fn custom_table_changes_routing() {
    let source = TempDir::new().unwrap();
    fs::write(source.path().join("part.step"), b"step").unwrap();
    let out = TempDir::new().unwrap();

    let config: Config = serde_json::from_str(
        r#"{"categories": [{"category": "cad", "extensions": [".step"]}]}"#,
    )
    .unwrap();
    let request = RunRequest::new(source_arg(source.path()), out.path());

    let result = run(&request, &config, &NullSink).unwrap();

    assert_eq!(result.files_copied, 1);
    assert!(out.path().join("cad/part.step").exists());
}

#[test]
fn missing_source_reports_unavailable() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let request = RunRequest::new(source_arg(&dir.path().join("gone")), &out);
    let sink = MemorySink::new();

    let err = run(&request, &Config::default(), &sink).unwrap_err();

    assert!(matches!(err, Error::SourceUnavailable { .. }));
    assert!(!out.exists());
    assert!(sink.lines().is_empty());
}

// ============================================================================
// Binary
// ============================================================================

#[test]
fn cli_missing_source_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    let status = bin()
        .args(["organize", source_arg(&dir.path().join("gone")).as_str(), "--output"])
        .arg(&out)
        .env_remove("AUTOMATOR_CONFIG")
        .output()
        .unwrap();

    assert!(!status.status.success());
    assert!(String::from_utf8_lossy(&status.stderr).contains("source unavailable"));
    assert!(!out.exists());
}

#[test]
fn cli_organize_json_reports_counts() {
    let source = create_project_dir();
    let out = TempDir::new().unwrap();

    let output = bin()
        .args(["organize", source_arg(source.path()).as_str(), "--json", "--output"])
        .arg(out.path())
        .env_remove("AUTOMATOR_CONFIG")
        .output()
        .unwrap();

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["files_scanned"], 4);
    assert_eq!(result["files_copied"], 3);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Copied: a.png -> images/"));
}

#[test]
fn cli_classify_prints_categories() {
    let output = bin()
        .args(["classify", "logo.PNG", "plan.dwg", "notes.md"])
        .env_remove("AUTOMATOR_CONFIG")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("images"));
    assert!(stdout.contains("cad"));
    assert!(stdout.contains("others"));
}

#[test]
fn cli_categories_lists_pdf_once() {
    let output = bin()
        .arg("categories")
        .env_remove("AUTOMATOR_CONFIG")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches(".pdf").count(), 1);

    let documents = stdout
        .lines()
        .find(|line| line.trim_start().starts_with("documents "))
        .unwrap();
    assert!(documents.contains(".docx"));
    assert!(!documents.contains(".pdf"));
}

#[test]
fn cli_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("automator.json");

    let first = bin()
        .args(["config", "init"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(first.status.success());
    assert!(Config::load(&path).is_ok());

    let second = bin()
        .args(["config", "init"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!second.status.success());
}
