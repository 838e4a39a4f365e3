//! CLI smoke tests for the installed binary.

use assert_cmd::Command;
use tempfile::TempDir;

#[test]
fn list_names_the_builtin_comparators() {
    let dir = TempDir::new().unwrap();
    let output = Command::cargo_bin("verup")
        .unwrap()
        .args(["list", "--tools-dir"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sampletool"));
    assert!(stdout.contains("demotool"));
    assert!(stdout.contains("icc2_smoke"));
}

#[test]
fn run_with_unstartable_tool_exits_nonzero_but_reports() {
    let dir = TempDir::new().unwrap();
    let output = Command::cargo_bin("verup")
        .unwrap()
        .current_dir(dir.path())
        .args(["run", "-t", "GhostTool", "--no-report"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("GhostTool"));
    assert!(stdout.contains("エラー: 1 件"));
}

#[test]
fn run_writes_both_reports_by_default() {
    let dir = TempDir::new().unwrap();
    let output = Command::cargo_bin("verup")
        .unwrap()
        .current_dir(dir.path())
        .args(["run", "-t", "GhostTool"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(dir.path().join("report.csv").exists());
    assert!(dir.path().join("report.html").exists());
}

#[test]
fn unknown_subcommand_is_rejected() {
    Command::cargo_bin("verup")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}
