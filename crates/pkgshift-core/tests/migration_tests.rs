//! Integration tests for running migration plans against a real tree.

use std::fs;
use std::path::Path;

use pkgshift_core::error::ShiftError;
use pkgshift_core::orchestrator::{EntryOutcome, NullReporter, Orchestrator};
use pkgshift_core::plan::Plan;
use pkgshift_core::tree::DiskTree;
use tempfile::TempDir;

const PLAN: &str = r#"
[[phase]]
name = "copy-ui-to-view"
rules = [
  { from = "import damose.data.model.", to = "import damose.model." },
  { from = "import damose.ui.", to = "import damose.view." },
  { from = "import damose.model.ConnectionMode;", to = "import damose.model.ConnectionMode;" },
]
relocate = [
  { source = "ui\\MainView.java", dest = "view\\MainView.java", old_package = "damose.ui", new_package = "damose.view" },
  { source = "ui/component/SearchOverlay.java", dest = "view/component/SearchOverlay.java", old_package = "damose.ui.component", new_package = "damose.view.component" },
]

[[phase]]
name = "fix-remaining-imports"
rules = [
  { from = "import damose.ui.", to = "import damose.view." },
  { from = "damose.data.model.", to = "damose.model." },
]
fixup = ["app/DamoseApp.java", "service/RouteService.java"]
"#;

const MAIN_VIEW: &str = "package damose.ui;\n\
\n\
import damose.data.model.Stop;\n\
import damose.ui.map.GeoUtils;\n\
import damose.model.ConnectionMode;\n\
\n\
public class MainView {}\n";

const APP: &str = "package damose.app;\n\nimport damose.ui.MainView;\n";
const ROUTE_SERVICE: &str = "package damose.service;\n\nimport java.util.List;\n";

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn setup() -> (TempDir, Plan) {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "ui/MainView.java", MAIN_VIEW);
    write(temp.path(), "app/DamoseApp.java", APP);
    write(temp.path(), "service/RouteService.java", ROUTE_SERVICE);
    let plan = Plan::from_toml_str(PLAN, temp.path()).unwrap();
    (temp, plan)
}

fn run(root: &Path, plan: &Plan) -> Result<pkgshift_core::RunReport, ShiftError> {
    Orchestrator::new(DiskTree::new(root)).run_plan(plan, &[], &mut NullReporter)
}

#[test]
fn relocation_creates_directories_and_rewrites() {
    let (temp, plan) = setup();
    run(temp.path(), &plan).unwrap();

    assert_eq!(
        read(temp.path(), "view/MainView.java"),
        "package damose.view;\n\
\n\
import damose.model.Stop;\n\
import damose.view.map.GeoUtils;\n\
import damose.model.ConnectionMode;\n\
\n\
public class MainView {}\n"
    );
}

#[test]
fn relocation_copies_and_leaves_source() {
    let (temp, plan) = setup();
    run(temp.path(), &plan).unwrap();
    assert_eq!(read(temp.path(), "ui/MainView.java"), MAIN_VIEW);
}

#[test]
fn missing_source_is_not_fatal_and_creates_nothing() {
    let (temp, plan) = setup();
    let report = run(temp.path(), &plan).unwrap();

    let first = &report.passes[0];
    assert_eq!(first.entries[0].outcome, EntryOutcome::Created);
    assert_eq!(first.entries[1].outcome, EntryOutcome::NotFound);
    assert!(!temp.path().join("view/component").exists());
    assert_eq!(report.summary.skipped, 1);
    assert!(!report.summary.is_complete());
}

#[test]
fn fixup_without_matches_leaves_file_untouched() {
    let (temp, plan) = setup();
    let path = temp.path().join("service/RouteService.java");
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let report = run(temp.path(), &plan).unwrap();

    let second = &report.passes[1];
    assert_eq!(second.entries[0].outcome, EntryOutcome::Updated);
    assert_eq!(second.entries[1].outcome, EntryOutcome::Unchanged);
    assert_eq!(second.entries[1].before_hash, second.entries[1].after_hash);
    assert_eq!(
        read(temp.path(), "service/RouteService.java"),
        ROUTE_SERVICE
    );
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    assert_eq!(
        read(temp.path(), "app/DamoseApp.java"),
        "package damose.app;\n\nimport damose.view.MainView;\n"
    );
}

#[test]
fn rerunning_a_plan_is_idempotent() {
    let (temp, plan) = setup();
    run(temp.path(), &plan).unwrap();
    let view = read(temp.path(), "view/MainView.java");
    let app = read(temp.path(), "app/DamoseApp.java");

    let second = run(temp.path(), &plan).unwrap();

    assert_eq!(read(temp.path(), "view/MainView.java"), view);
    assert_eq!(read(temp.path(), "app/DamoseApp.java"), app);
    // Relocations always rewrite their destination; fixups find nothing left.
    assert_eq!(second.summary.created, 1);
    assert_eq!(second.summary.updated, 0);
    assert_eq!(second.summary.unchanged, 2);
}

#[test]
fn write_failure_aborts_naming_the_entry() {
    let (temp, plan) = setup();
    // A file where the destination directory should be.
    write(temp.path(), "view", "not a directory");

    let err = run(temp.path(), &plan).unwrap_err();

    assert_eq!(err.error_code().code(), 4);
    match &err {
        ShiftError::Aborted { phase, entry, source } => {
            assert_eq!(phase, "copy-ui-to-view");
            assert_eq!(entry, "ui/MainView.java");
            assert!(matches!(**source, ShiftError::WriteFailure { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The fixup phase never ran.
    assert_eq!(read(temp.path(), "app/DamoseApp.java"), APP);
}

#[test]
fn plan_file_root_is_relative_to_the_plan() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "plans/p.toml", "root = \"../src\"\n");
    let plan = Plan::load(&temp.path().join("plans/p.toml")).unwrap();
    assert_eq!(plan.root(), temp.path().join("plans").join("../src"));
    assert!(plan.phases().is_empty());
}
