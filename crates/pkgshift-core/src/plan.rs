//! Migration plans: the TOML configuration a run is driven by.
//!
//! ```toml
//! root = "src/main/java/damose"
//!
//! [[phase]]
//! name = "copy-ui-to-view"
//! rules = [{ from = "import damose.ui.", to = "import damose.view." }]
//! relocate = [
//!   { source = "ui/MainView.java", dest = "view/MainView.java",
//!     old_package = "damose.ui", new_package = "damose.view" },
//! ]
//! fixup = ["app/DamoseApp.java"]
//! ```
//!
//! `root` is resolved against the directory holding the plan file. Within
//! a phase, relocation entries are processed before fixup entries, each in
//! file order.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ShiftError, ShiftResult};
use crate::manifest::{EntryKind, Manifest, MigrationEntry};
use crate::rules::RuleTable;

// ============================================================================
// File Format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanFile {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default, rename = "phase")]
    phases: Vec<PhaseFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhaseFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    rules: RuleTable,
    #[serde(default)]
    relocate: Vec<RelocationFile>,
    #[serde(default)]
    fixup: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RelocationFile {
    source: String,
    dest: String,
    old_package: String,
    new_package: String,
}

// ============================================================================
// Plan
// ============================================================================

/// One pass: a rule table and the manifest it is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    name: String,
    description: Option<String>,
    rules: RuleTable,
    manifest: Manifest,
}

impl Phase {
    pub fn new(name: impl Into<String>, rules: RuleTable, manifest: Manifest) -> Self {
        Phase {
            name: name.into(),
            description: None,
            rules,
            manifest,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Cross-cutting rules applied to every entry of the phase.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

/// A tree root plus the phases to run against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    root: PathBuf,
    phases: Vec<Phase>,
}

impl Plan {
    pub fn new(root: impl Into<PathBuf>, phases: Vec<Phase>) -> Self {
        Plan {
            root: root.into(),
            phases,
        }
    }

    /// Load a plan file. Its `root` is taken relative to the file's directory.
    pub fn load(path: &Path) -> ShiftResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ShiftError::invalid_plan(format!("failed to read {}: {}", path.display(), e))
        })?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::from_toml_str(&text, base)
    }

    /// Parse a plan, resolving a relative `root` against `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> ShiftResult<Self> {
        let file: PlanFile = toml::from_str(text)
            .map_err(|e| ShiftError::invalid_plan(format!("failed to parse plan: {}", e)))?;

        let root = match file.root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        };

        let mut phases = Vec::with_capacity(file.phases.len());
        for phase in file.phases {
            if phase.name.trim().is_empty() {
                return Err(ShiftError::invalid_plan("phase name must not be empty"));
            }
            let mut manifest = Manifest::default();
            for r in &phase.relocate {
                manifest.push(MigrationEntry::relocation(
                    &r.source,
                    &r.dest,
                    r.old_package.as_str(),
                    r.new_package.as_str(),
                )?);
            }
            for path in &phase.fixup {
                manifest.push(MigrationEntry::fixup(path)?);
            }
            phases.push(Phase {
                name: phase.name,
                description: phase.description,
                rules: phase.rules,
                manifest,
            });
        }

        Ok(Plan { root, phases })
    }

    /// Replace the tree root (CLI `--root`).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Phases named in `names`, in plan order. Empty `names` selects all.
    pub fn select(&self, names: &[String]) -> ShiftResult<Vec<&Phase>> {
        if names.is_empty() {
            return Ok(self.phases.iter().collect());
        }
        if let Some(unknown) = names.iter().find(|n| self.phase(n).is_none()) {
            return Err(ShiftError::invalid_args(format!(
                "unknown phase '{}'",
                unknown
            )));
        }
        Ok(self
            .phases
            .iter()
            .filter(|p| names.iter().any(|n| *n == p.name))
            .collect())
    }

    /// Check the plan for problems that make a run unsafe or surprising.
    pub fn validate(&self) -> Vec<PlanIssue> {
        let mut issues = Vec::new();
        let mut names = BTreeSet::new();

        for phase in &self.phases {
            if !names.insert(phase.name.as_str()) {
                issues.push(PlanIssue::error(&phase.name, "duplicate phase name"));
            }

            for (index, rule) in phase.rules.iter().enumerate() {
                if rule.match_text.is_empty() {
                    issues.push(PlanIssue::error(
                        &phase.name,
                        format!("rule {} has an empty pattern", index),
                    ));
                } else if rule.is_identity() {
                    issues.push(PlanIssue::info(
                        &phase.name,
                        format!(
                            "rule {} ('{}') replaces text with itself",
                            index, rule.match_text
                        ),
                    ));
                }
            }

            for shadow in phase.rules.shadowed() {
                let earlier = &phase.rules.rules()[shadow.earlier];
                let later = &phase.rules.rules()[shadow.later];
                issues.push(PlanIssue::warning(
                    &phase.name,
                    format!(
                        "rule {} ('{}') runs after rule {} ('{}') and can only match text it reintroduces",
                        shadow.later, later.match_text, shadow.earlier, earlier.match_text
                    ),
                ));
            }

            for dest in phase.manifest.duplicate_destinations() {
                issues.push(PlanIssue::error(
                    &phase.name,
                    format!("'{}' is the destination of more than one entry", dest),
                ));
            }

            if phase.manifest.is_empty() {
                issues.push(PlanIssue::info(&phase.name, "phase has no entries"));
            } else if phase.rules.is_empty() && phase.manifest.count(EntryKind::Relocation) == 0 {
                issues.push(PlanIssue::warning(
                    &phase.name,
                    "phase has only fixup entries and no rules; it cannot change anything",
                ));
            }
        }

        issues
    }
}

// ============================================================================
// Validation Issues
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A problem found by [`Plan::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanIssue {
    pub severity: Severity,
    pub phase: String,
    pub message: String,
}

impl PlanIssue {
    fn new(severity: Severity, phase: &str, message: impl Into<String>) -> Self {
        PlanIssue {
            severity,
            phase: phase.to_string(),
            message: message.into(),
        }
    }

    pub fn error(phase: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, phase, message)
    }

    pub fn warning(phase: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, phase, message)
    }

    pub fn info(phase: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, phase, message)
    }
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.phase, self.message)
    }
}

/// True if any issue is an error.
pub fn has_errors(issues: &[PlanIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

// ============================================================================
// Tests
// ============================================================================
