//! Drives passes over a manifest.
//!
//! Each entry is read, transformed and written before the next one
//! starts. Entries never see each other's output within a pass, but a
//! later pass reads what earlier passes wrote.
//!
//! ## Failure Policy
//!
//! - A missing source is recorded as `not_found` and the pass continues.
//! - A read or write failure aborts the pass. The error names the phase
//!   and the entry; every outcome before it has already been handed to
//!   the [`Reporter`].

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ShiftError, ShiftResult};
use crate::manifest::{EntryKind, MigrationEntry};
use crate::plan::{Phase, Plan};
use crate::relocate::{RelocateOutcome, Relocator};
use crate::rules::RuleHit;
use crate::transform::{ContentHash, Transformer};
use crate::tree::SourceTree;

// ============================================================================
// Outcomes
// ============================================================================

/// Final state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    /// A relocation entry wrote its destination.
    Created,
    /// A fixup entry changed its file.
    Updated,
    /// A fixup entry found nothing to change.
    Unchanged,
    /// The source did not exist; nothing was touched.
    NotFound,
}

impl EntryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EntryOutcome::Created => "created",
            EntryOutcome::Updated => "updated",
            EntryOutcome::Unchanged => "unchanged",
            EntryOutcome::NotFound => "not_found",
        }
    }
}

/// What happened to one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub source: String,
    pub dest: String,
    pub kind: EntryKind,
    pub outcome: EntryOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hits: Vec<RuleHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_hash: Option<ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_hash: Option<ContentHash>,
}

impl EntryReport {
    fn new(entry: &MigrationEntry, outcome: RelocateOutcome) -> Self {
        let kind = match &outcome {
            RelocateOutcome::Created(_) => EntryOutcome::Created,
            RelocateOutcome::Updated(_) => EntryOutcome::Updated,
            RelocateOutcome::Unchanged(_) => EntryOutcome::Unchanged,
            RelocateOutcome::Skipped(_) => EntryOutcome::NotFound,
        };
        let result = outcome.result();
        EntryReport {
            source: entry.source_path().to_string(),
            dest: entry.dest_path().to_string(),
            kind: entry.kind(),
            outcome: kind,
            hits: result.map(|r| r.hits.clone()).unwrap_or_default(),
            before_hash: result.map(|r| r.before_hash()),
            after_hash: result.map(|r| r.after_hash()),
        }
    }
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Created => self.created += 1,
            EntryOutcome::Updated => self.updated += 1,
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::NotFound => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &Summary) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped
    }

    /// True if no entry was skipped for a missing source.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

/// Result of running one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub phase: String,
    pub entries: Vec<EntryReport>,
    pub summary: Summary,
}

/// Result of running several phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub passes: Vec<PassReport>,
    pub summary: Summary,
}

// ============================================================================
// Reporting
// ============================================================================

/// Receives outcomes as they happen.
pub trait Reporter {
    fn entry(&mut self, phase: &str, report: &EntryReport);
    fn pass_finished(&mut self, report: &PassReport);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn entry(&mut self, _phase: &str, _report: &EntryReport) {}
    fn pass_finished(&mut self, _report: &PassReport) {}
}

/// Keeps every outcome grouped by pass, including a pass cut short by an
/// abort.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    passes: Vec<PassReport>,
    in_pass: bool,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passes(&self) -> &[PassReport] {
        &self.passes
    }

    pub fn into_passes(self) -> Vec<PassReport> {
        self.passes
    }
}

impl Reporter for CollectingReporter {
    fn entry(&mut self, phase: &str, report: &EntryReport) {
        if !self.in_pass {
            self.passes.push(PassReport {
                phase: phase.to_string(),
                entries: Vec::new(),
                summary: Summary::default(),
            });
            self.in_pass = true;
        }
        if let Some(pass) = self.passes.last_mut() {
            pass.summary.record(report.outcome);
            pass.entries.push(report.clone());
        }
    }

    fn pass_finished(&mut self, report: &PassReport) {
        if self.in_pass {
            self.passes.pop();
        }
        self.passes.push(report.clone());
        self.in_pass = false;
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs phases against a tree.
#[derive(Debug)]
pub struct Orchestrator<T: SourceTree> {
    relocator: Relocator<T>,
}

impl<T: SourceTree> Orchestrator<T> {
    pub fn new(tree: T) -> Self {
        Orchestrator {
            relocator: Relocator::new(tree),
        }
    }

    pub fn tree(&self) -> &T {
        self.relocator.tree()
    }

    pub fn into_tree(self) -> T {
        self.relocator.into_tree()
    }

    /// Run one phase over its manifest, in manifest order.
    pub fn run(&mut self, phase: &Phase, reporter: &mut dyn Reporter) -> ShiftResult<PassReport> {
        let transformer = Transformer::new(phase.rules());
        let mut entries = Vec::with_capacity(phase.manifest().len());
        let mut summary = Summary::default();

        info!(
            phase = phase.name(),
            entries = phase.manifest().len(),
            rules = phase.rules().len(),
            "starting pass"
        );

        for entry in phase.manifest() {
            let report = self
                .run_entry(&transformer, entry)
                .map_err(|e| ShiftError::aborted(phase.name(), entry.source_path(), e))?;

            match report.outcome {
                EntryOutcome::NotFound => {
                    warn!(phase = phase.name(), source = %report.source, "source not found")
                }
                outcome => info!(
                    phase = phase.name(),
                    dest = %report.dest,
                    outcome = outcome.label(),
                    "entry processed"
                ),
            }

            reporter.entry(phase.name(), &report);
            summary.record(report.outcome);
            entries.push(report);
        }

        let pass = PassReport {
            phase: phase.name().to_string(),
            entries,
            summary,
        };
        info!(
            phase = phase.name(),
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "pass finished"
        );
        reporter.pass_finished(&pass);
        Ok(pass)
    }

    /// Run the phases of `plan` named in `phases` (all if empty), in plan order.
    pub fn run_plan(
        &mut self,
        plan: &Plan,
        phases: &[String],
        reporter: &mut dyn Reporter,
    ) -> ShiftResult<RunReport> {
        let mut report = RunReport::default();
        for phase in plan.select(phases)? {
            let pass = self.run(phase, reporter)?;
            report.summary.merge(&pass.summary);
            report.passes.push(pass);
        }
        Ok(report)
    }

    fn run_entry(
        &mut self,
        transformer: &Transformer<'_>,
        entry: &MigrationEntry,
    ) -> ShiftResult<EntryReport> {
        let rewrite = |raw: &str| transformer.transform(raw, entry);
        let outcome = match entry.kind() {
            EntryKind::Relocation => {
                self.relocator
                    .relocate(entry.source_path(), entry.dest_path(), rewrite)?
            }
            EntryKind::ImportFixup => {
                self.relocator
                    .rewrite_in_place(entry.source_path(), rewrite)?
            }
        };
        Ok(EntryReport::new(entry, outcome))
    }
}

// ============================================================================
// Tests
// ============================================================================
