use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Run the binary inside `dir` with no ambient API key.
fn mdaccess(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mdaccess"))
        .current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .args(args)
        .output()
        .unwrap()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn changes_prints_markdown_additions_with_line_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let out = mdaccess(dir.path(), &["changes", path_arg(&fixture("docs.diff"))]);
    assert!(out.status.success(), "changes failed: {}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["path"], "docs/Guide.md");
    assert_eq!(files[0]["lines"][0]["line_number"], 1);
    assert_eq!(files[0]["lines"][0]["content"], "## Title");
    assert_eq!(files[0]["lines"][1]["line_number"], 3);
    assert_eq!(files[1]["path"], "CHANGELOG.md");
    assert!(files[1]["lines"].as_array().unwrap().is_empty());
}

#[test]
fn structure_prints_extracted_elements() {
    let dir = tempfile::tempdir().unwrap();
    let out = mdaccess(dir.path(), &["structure", path_arg(&fixture("lesson.md"))]);
    assert!(out.status.success(), "structure failed: {}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["headings"][0]["text"], "Lesson 1");
    assert_eq!(json["images"][0]["alt"], "");
    assert_eq!(json["links"][0]["url"], "syllabus.md");
    assert_eq!(json["tables"].as_array().unwrap().len(), 1);
    assert_eq!(json["code_blocks"][0]["language"], "python");
}

#[test]
fn review_without_markdown_writes_minimal_report() {
    let dir = tempfile::tempdir().unwrap();
    let out = mdaccess(dir.path(), &["review", path_arg(&fixture("code_only.diff"))]);
    assert!(out.status.success(), "review failed: {}", String::from_utf8_lossy(&out.stderr));

    let report = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert_eq!(report, "# Accessibility PR Review\n\n- No modified files were provided.\n");
}

#[test]
fn review_records_judge_failures_and_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("out.md");
    let out = mdaccess(
        dir.path(),
        &["review", path_arg(&fixture("docs.diff")), "--output", path_arg(&report_path)],
    );
    assert!(out.status.success(), "review failed: {}", String::from_utf8_lossy(&out.stderr));

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("- Files received: 2"));
    // CHANGELOG.md only lost a line, so it is reviewed without calling the judge.
    assert!(report.contains("## File: `CHANGELOG.md`"));
    assert!(report.contains("- Score: 100/100"));
    assert!(report.contains("## Files With Review Errors"));
    assert!(report.contains("- `docs/Guide.md`: missing API key"));
}

#[test]
fn review_json_format_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("out.json");
    let out = mdaccess(
        dir.path(),
        &["review", path_arg(&fixture("docs.diff")), "--format", "json", "--output", path_arg(&report_path)],
    );
    assert!(out.status.success(), "review failed: {}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["overview"]["reviewed_files"], 1);
    assert_eq!(json["overview"]["failed_files"], 1);
    assert_eq!(json["failures"][0]["path"], "docs/Guide.md");
}

#[test]
fn config_file_sets_report_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".mdaccess.toml"), "output = \"a11y.md\"\n").unwrap();
    let out = mdaccess(dir.path(), &["review", path_arg(&fixture("code_only.diff"))]);
    assert!(out.status.success(), "review failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("a11y.md").exists());
}

#[test]
fn empty_document_scores_full_marks_offline() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("empty.md");
    std::fs::write(&doc, "\n\n").unwrap();
    let out = mdaccess(dir.path(), &["document", path_arg(&doc)]);
    assert!(out.status.success(), "document failed: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("## Overall Score: 100/100"));
    assert!(stdout.contains("The uploaded Markdown document is empty."));
}

#[test]
fn missing_diff_is_reported_as_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let out = mdaccess(dir.path(), &["review", "nope.diff"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error: File Not Found"), "stderr: {stderr}");
    assert!(!dir.path().join("report.md").exists());
}

#[test]
fn malformed_config_aborts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".mdaccess.toml"), "temperature = \"hot\"\n").unwrap();
    let out = mdaccess(dir.path(), &["changes", path_arg(&fixture("docs.diff"))]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid TOML"));
}

#[test]
fn rules_flag_overrides_config_and_reaches_the_review() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".mdaccess.toml"), "rules = \"stale-rules.md\"\n").unwrap();
    std::fs::write(dir.path().join("rules.md"), "Every image needs alt text.\n").unwrap();
    std::fs::write(dir.path().join("empty.md"), "").unwrap();

    let out = mdaccess(dir.path(), &["document", "empty.md", "--rules", "rules.md"]);
    assert!(out.status.success(), "document failed: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("## Applied Custom Rules"), "stdout: {stdout}");
}

#[test]
fn missing_rules_file_is_reported_as_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty.md"), "").unwrap();

    let out = mdaccess(dir.path(), &["document", "empty.md", "--rules", "absent.md"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error: File Not Found"), "stderr: {stderr}");
    assert!(stderr.contains("absent.md"), "stderr: {stderr}");
}

#[test]
fn model_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".mdaccess.toml"), "model = \"configured-model\"\n").unwrap();
    std::fs::write(dir.path().join("empty.md"), "").unwrap();

    let out = mdaccess(dir.path(), &["--verbose", "document", "empty.md", "--model", "flag-model"]);
    assert!(out.status.success(), "document failed: {}", String::from_utf8_lossy(&out.stderr));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("flag-model"), "stderr: {stderr}");
    assert!(!stderr.contains("configured-model"), "stderr: {stderr}");
}
