//! CLI integration tests for pkgshift commands

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const PLAN: &str = r#"
root = "src"

[[phase]]
name = "copy-ui-to-view"
rules = [
  { from = "import damose.data.model.", to = "import damose.model." },
  { from = "import damose.ui.", to = "import damose.view." },
]
relocate = [
  { source = "main/java/damose/ui/MainView.java", dest = "main/java/damose/view/MainView.java", old_package = "damose.ui", new_package = "damose.view" },
  { source = "main/java/damose/ui/component/SearchOverlay.java", dest = "main/java/damose/view/component/SearchOverlay.java", old_package = "damose.ui.component", new_package = "damose.view.component" },
]

[[phase]]
name = "update-test-imports"
rules = [
  { from = "import damose.ui.", to = "import damose.view." },
  { from = "damose.data.model.", to = "damose.model." },
]
fixup = ["test/java/damose/ui/map/GeoUtilsTest.java"]
"#;

fn pkgshift(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pkgshift"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run pkgshift")
}

fn setup() -> TempDir {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let files = [
        (
            "src/main/java/damose/ui/MainView.java",
            "package damose.ui;\n\nimport damose.data.model.Stop;\n\npublic class MainView {}\n",
        ),
        (
            "src/test/java/damose/ui/map/GeoUtilsTest.java",
            "package damose.ui.map;\n\nimport damose.ui.map.GeoUtils;\n",
        ),
    ];
    for (path, content) in files {
        let full = temp.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    fs::write(temp.path().join("plan.toml"), PLAN).unwrap();
    temp
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn run_prints_entry_lines_and_writes_files() {
    let temp = setup();
    let output = pkgshift(&["run", "plan.toml"], temp.path());

    assert!(output.status.success(), "{}", stdout(&output));
    let text = stdout(&output);
    assert!(text.contains("✓ Created: main/java/damose/view/MainView.java"));
    assert!(text.contains(
        "✗ Source not found: main/java/damose/ui/component/SearchOverlay.java"
    ));
    assert!(text.contains("✓ Updated: test/java/damose/ui/map/GeoUtilsTest.java"));
    assert!(text.contains(
        "Done: 2 passes, 1 created, 1 updated, 0 unchanged, 1 not found"
    ));

    let view =
        fs::read_to_string(temp.path().join("src/main/java/damose/view/MainView.java")).unwrap();
    assert!(view.starts_with("package damose.view;\n\nimport damose.model.Stop;\n"));
}

#[test]
fn dry_run_touches_nothing() {
    let temp = setup();
    let output = pkgshift(&["run", "plan.toml", "--dry-run", "--diff"], temp.path());

    assert!(output.status.success());
    assert!(!temp.path().join("src/main/java/damose/view").exists());
    let src = temp.path().join("src");
    let test_file =
        fs::read_to_string(src.join("test/java/damose/ui/map/GeoUtilsTest.java")).unwrap();
    assert!(test_file.contains("import damose.ui.map.GeoUtils;"));

    let text = stdout(&output);
    assert!(text.contains("+++ b/main/java/damose/view/MainView.java"));
    assert!(text.contains(
        "-import damose.ui.map.GeoUtils;\n+import damose.view.map.GeoUtils;"
    ));
    assert!(text.contains("Dry run: no files were written."));
}

#[test]
fn json_output_parses() {
    let temp = setup();
    let output = pkgshift(
        &[
            "run",
            "plan.toml",
            "--format",
            "json",
            "--phase",
            "copy-ui-to-view",
            "--dry-run",
        ],
        temp.path(),
    );

    assert!(output.status.success());
    let response = json(&output);
    assert_eq!(response["status"], "incomplete");
    assert_eq!(response["schema_version"], "1");
    assert_eq!(response["dry_run"], true);
    assert_eq!(response["passes"].as_array().unwrap().len(), 1);
    assert_eq!(response["passes"][0]["entries"][0]["outcome"], "created");
    assert_eq!(response["passes"][0]["entries"][1]["outcome"], "not_found");
    assert_eq!(response["summary"]["created"], 1);
}

#[test]
fn strict_run_with_missing_source_exits_3() {
    let temp = setup();
    let output = pkgshift(&["run", "plan.toml", "--strict"], temp.path());
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn unknown_phase_is_an_error_response() {
    let temp = setup();
    let output = pkgshift(&["run", "plan.toml", "--phase", "nope"], temp.path());

    assert_eq!(output.status.code(), Some(2));
    let response = json(&output);
    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["code"], 2);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("unknown phase 'nope'"));
}

const BLOCKED_PLAN: &str = r#"
root = "src"

[[phase]]
name = "move"
relocate = [
  { source = "A.java", dest = "view/A.java", old_package = "app", new_package = "app.view" },
  { source = "B.java", dest = "blocked/B.java", old_package = "app", new_package = "app.blocked" },
]
"#;

/// A tree whose second relocation cannot be written: `blocked` is a file.
fn blocked_setup() -> TempDir {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("A.java"), "package app;\n").unwrap();
    fs::write(src.join("B.java"), "package app;\n").unwrap();
    fs::write(src.join("blocked"), "not a directory").unwrap();
    fs::write(temp.path().join("plan.toml"), BLOCKED_PLAN).unwrap();
    temp
}

#[test]
fn json_abort_reports_entries_already_written() {
    let temp = blocked_setup();
    let output = pkgshift(&["run", "plan.toml", "--format", "json"], temp.path());

    assert_eq!(output.status.code(), Some(4));
    let response = json(&output);
    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["code"], 4);
    let completed = response["completed"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["phase"], "move");
    let entries = completed[0]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["dest"], "view/A.java");
    assert_eq!(entries[0]["outcome"], "created");

    let written = fs::read_to_string(temp.path().join("src/view/A.java")).unwrap();
    assert_eq!(written, "package app.view;\n");
}

#[test]
fn text_abort_keeps_streamed_lines() {
    let temp = blocked_setup();
    let output = pkgshift(&["run", "plan.toml"], temp.path());

    assert_eq!(output.status.code(), Some(4));
    let text = stdout(&output);
    assert!(text.starts_with("✓ Created: view/A.java\n"));
    assert!(text.contains("\"status\": \"error\""));
}

#[test]
fn scan_of_missing_root_exits_2() {
    let temp = setup();
    let output = pkgshift(&["--root", "nowhere", "scan", "plan.toml"], temp.path());

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json(&output)["error"]["code"], 2);
}

#[test]
fn check_flags_bad_plans() {
    let temp = setup();
    fs::write(
        temp.path().join("bad.toml"),
        r#"
[[phase]]
name = "overlap"
rules = [
  { from = "import damose.", to = "import app." },
  { from = "import damose.ui.", to = "import app.view." },
]
relocate = [
  { source = "a/A.java", dest = "b/A.java", old_package = "a", new_package = "b" },
  { source = "c/A.java", dest = "b/A.java", old_package = "c", new_package = "b" },
]
"#,
    )
    .unwrap();

    let output = pkgshift(&["check", "bad.toml", "--format", "json"], temp.path());

    assert_eq!(output.status.code(), Some(2));
    let response = json(&output);
    assert_eq!(response["status"], "error");
    let severities: Vec<&str> = response["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["severity"].as_str().unwrap())
        .collect();
    assert!(severities.contains(&"error"));
    assert!(severities.contains(&"warning"));

    // A bad plan is refused by run before anything is written.
    let output = pkgshift(&["run", "bad.toml"], temp.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn check_accepts_good_plan() {
    let temp = setup();
    let output = pkgshift(&["check", "plan.toml"], temp.path());
    assert!(output.status.success());
    assert!(stdout(&output).ends_with("0 errors, 0 warnings\n"));
}

#[test]
fn scan_lists_residual_references() {
    let temp = setup();
    let output = pkgshift(&["scan", "plan.toml", "--format", "json"], temp.path());

    assert!(output.status.success());
    let response = json(&output);
    let paths: Vec<&str> = response["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        paths,
        vec![
            "main/java/damose/ui/MainView.java",
            "test/java/damose/ui/map/GeoUtilsTest.java"
        ]
    );
}

#[test]
fn root_flag_overrides_plan_root() {
    let temp = setup();
    let elsewhere = temp.path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();

    let output = pkgshift(
        &["--root", elsewhere.to_str().unwrap(), "run", "plan.toml"],
        temp.path(),
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("0 created, 0 updated, 0 unchanged, 3 not found"));
}

#[test]
fn phases_lists_counts() {
    let temp = setup();
    let output = pkgshift(&["phases", "plan.toml", "--format", "json"], temp.path());

    assert!(output.status.success());
    let response = json(&output);
    assert_eq!(response["phases"][0]["name"], "copy-ui-to-view");
    assert_eq!(response["phases"][0]["relocations"], 2);
    assert_eq!(response["phases"][1]["fixups"], 1);
}

#[test]
fn shipped_plan_is_clean() {
    let plan = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../plans/damose-mvc.toml");
    let temp = tempfile::tempdir().unwrap();
    let output = pkgshift(
        &["check", plan.to_str().unwrap(), "--format", "json"],
        temp.path(),
    );

    assert!(output.status.success(), "{}", stdout(&output));
    let response = json(&output);
    let issues = response["issues"].as_array().unwrap();
    assert!(issues.iter().all(|i| i["severity"] == "info"));
}
