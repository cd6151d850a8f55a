//! Command implementations behind the `pkgshift` binary.
//!
//! Each function takes an already-loaded [`Plan`] and returns a value the
//! binary renders as text or JSON. Nothing here writes to stdout.
//!
//! ## Dry Runs
//!
//! A dry run drives the same orchestrator over an [`OverlayTree`], so later
//! phases see what earlier phases would have written. Diffs are computed
//! from the overlay's staged writes against what is on disk.

use std::path::Path;

use tracing::{info, warn};

use pkgshift_core::diff::generate_unified_diff;
use pkgshift_core::error::{ShiftError, ShiftResult};
use pkgshift_core::orchestrator::{Orchestrator, Reporter, RunReport};
use pkgshift_core::output::{CheckResponse, FileDiff, PhaseInfo, PhasesResponse};
use pkgshift_core::plan::{has_errors, Plan, Severity};
use pkgshift_core::rules::RuleTable;
use pkgshift_core::scan::{scan_residue, Residue};
use pkgshift_core::tree::{DiskTree, OverlayTree, SourceTree};

/// Options for [`run_plan`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Phases to run; empty runs all of them.
    pub phases: Vec<String>,
    /// Stage writes in memory instead of touching disk.
    pub dry_run: bool,
    /// Collect diffs of staged writes (dry runs only).
    pub diff: bool,
}

/// Result of [`run_plan`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub diffs: Vec<FileDiff>,
}

/// Load a plan file, replacing its root with `root` when given.
pub fn load_plan(path: &Path, root: Option<&Path>) -> ShiftResult<Plan> {
    let plan = Plan::load(path)?;
    Ok(match root {
        Some(root) => plan.with_root(root),
        None => plan,
    })
}

/// Validate `plan`, then run the selected phases.
///
/// Error-severity issues refuse the run before any file is touched.
/// Warnings are logged and the run proceeds.
pub fn run_plan(
    plan: &Plan,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
) -> ShiftResult<RunOutcome> {
    let issues = plan.validate();
    if has_errors(&issues) {
        let messages: Vec<String> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.to_string())
            .collect();
        return Err(ShiftError::invalid_plan(messages.join("; ")));
    }
    for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
        warn!(phase = %issue.phase, "{}", issue.message);
    }

    ensure_root(plan)?;

    info!(root = %plan.root().display(), dry_run = options.dry_run, "running plan");

    if options.dry_run {
        let mut orchestrator = Orchestrator::new(OverlayTree::new(plan.root()));
        let report = orchestrator.run_plan(plan, &options.phases, reporter)?;
        let diffs = if options.diff {
            staged_diffs(&orchestrator.into_tree())
        } else {
            Vec::new()
        };
        Ok(RunOutcome { report, diffs })
    } else {
        let mut orchestrator = Orchestrator::new(DiskTree::new(plan.root()));
        let report = orchestrator.run_plan(plan, &options.phases, reporter)?;
        Ok(RunOutcome {
            report,
            diffs: Vec::new(),
        })
    }
}

/// Fail with invalid arguments unless the plan's root is a directory.
fn ensure_root(plan: &Plan) -> ShiftResult<()> {
    if !plan.root().is_dir() {
        return Err(ShiftError::invalid_args(format!(
            "tree root {} is not a directory",
            plan.root().display()
        )));
    }
    Ok(())
}

/// Diff every staged write against the file on disk, skipping no-ops.
fn staged_diffs(tree: &OverlayTree) -> Vec<FileDiff> {
    tree.staged()
        .filter_map(|(path, content)| {
            let before = if tree.base().exists(path) {
                tree.base().read_to_string(path).ok()
            } else {
                None
            };
            let diff = generate_unified_diff(path, before.as_deref(), content);
            (!diff.is_empty()).then(|| FileDiff {
                path: path.to_string(),
                diff,
            })
        })
        .collect()
}

/// Validate `plan` without running it.
pub fn check_plan(plan: &Plan) -> CheckResponse {
    CheckResponse::new(plan.validate())
}

/// Scan the plan's tree for text still matching the rules of the selected
/// phases.
pub fn scan_plan(plan: &Plan, phases: &[String], include: &str) -> ShiftResult<Vec<Residue>> {
    let mut rules = RuleTable::default();
    for phase in plan.select(phases)? {
        rules.extend(phase.rules().iter().cloned());
    }
    ensure_root(plan)?;
    scan_residue(plan.root(), &rules, include)
}

/// Summarize the phases of `plan`.
pub fn list_phases(plan: &Plan) -> PhasesResponse {
    PhasesResponse::new(
        plan.root().display().to_string(),
        plan.phases().iter().map(PhaseInfo::from_phase).collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================
