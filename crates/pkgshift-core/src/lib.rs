//! Core engine for pkgshift.
//!
//! pkgshift migrates a source tree through a package reorganization by
//! copying files between package directories, redeclaring their package,
//! and repairing imports across the tree with ordered literal rewrites.
//! It works on text, not syntax trees, and is safe to re-run.
//!
//! This crate provides:
//! - Rule tables and literal rewriting (`rules`)
//! - Per-entry content transformation (`transform`)
//! - Filesystem access, real and dry-run (`tree`)
//! - Copy-based relocation and in-place rewrites (`relocate`)
//! - Manifests and TOML migration plans (`manifest`, `plan`)
//! - Pass orchestration and reporting (`orchestrator`)
//! - Residual reference scans (`scan`)
//! - Diff previews, JSON output types, and error codes

pub mod diff;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod plan;
pub mod relocate;
pub mod rules;
pub mod scan;
pub mod transform;
pub mod tree;

pub use error::{OutputErrorCode, ShiftError, ShiftResult};
pub use manifest::{EntryKind, Manifest, MigrationEntry, PackageMove};
pub use orchestrator::{
    CollectingReporter, EntryOutcome, EntryReport, NullReporter, Orchestrator, PassReport,
    Reporter, RunReport, Summary,
};
pub use plan::{Phase, Plan, PlanIssue, Severity};
pub use relocate::{RelocateOutcome, Relocator, SkipReason};
pub use rules::{RewriteRule, RuleHit, RuleTable};
pub use transform::{ContentHash, TransformResult, Transformer};
pub use tree::{DiskTree, OverlayTree, SourceTree};
