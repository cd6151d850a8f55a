//! JSON output types for CLI responses.
//!
//! Every response carries `status` first and a `schema_version`, so
//! scripts driving a phased migration can parse results without scraping
//! the text report.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::{OutputErrorCode, ShiftError};
use crate::manifest::EntryKind;
use crate::orchestrator::{PassReport, RunReport, Summary};
use crate::plan::{Phase, PlanIssue};
use crate::scan::Residue;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// A previewed file change.
#[derive(Debug, Clone, Serialize)]
pub struct FileDiff {
    pub path: String,
    pub diff: String,
}

/// Response for `run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub status: String,
    pub schema_version: String,
    pub dry_run: bool,
    pub passes: Vec<PassReport>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<FileDiff>,
}

impl RunResponse {
    /// Status is "incomplete" when any entry was skipped for a missing
    /// source, "ok" otherwise.
    pub fn new(report: RunReport, dry_run: bool, diffs: Vec<FileDiff>) -> Self {
        let status = if report.summary.is_complete() {
            "ok"
        } else {
            "incomplete"
        };
        RunResponse {
            status: status.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            dry_run,
            passes: report.passes,
            summary: report.summary,
            diffs,
        }
    }
}

/// Response for `check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    /// "ok" if there are no error-severity issues, "error" otherwise.
    pub status: String,
    pub schema_version: String,
    pub issues: Vec<PlanIssue>,
}

impl CheckResponse {
    pub fn new(issues: Vec<PlanIssue>) -> Self {
        let status = if crate::plan::has_errors(&issues) {
            "error"
        } else {
            "ok"
        };
        CheckResponse {
            status: status.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            issues,
        }
    }
}

/// Response for `scan`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub status: String,
    pub schema_version: String,
    pub files: Vec<Residue>,
}

impl ScanResponse {
    pub fn new(files: Vec<Residue>) -> Self {
        ScanResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
        }
    }
}

/// One row of the `phases` listing.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: usize,
    pub relocations: usize,
    pub fixups: usize,
}

impl PhaseInfo {
    pub fn from_phase(phase: &Phase) -> Self {
        PhaseInfo {
            name: phase.name().to_string(),
            description: phase.description().map(str::to_string),
            rules: phase.rules().len(),
            relocations: phase.manifest().count(EntryKind::Relocation),
            fixups: phase.manifest().count(EntryKind::ImportFixup),
        }
    }
}

/// Response for `phases`.
#[derive(Debug, Clone, Serialize)]
pub struct PhasesResponse {
    pub status: String,
    pub schema_version: String,
    pub root: String,
    pub phases: Vec<PhaseInfo>,
}

impl PhasesResponse {
    pub fn new(root: String, phases: Vec<PhaseInfo>) -> Self {
        PhasesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            root,
            phases,
        }
    }
}

/// Error information for error responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: u8,
    pub message: String,
    /// The file involved, when the error concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorInfo {
    pub fn from_error(err: &ShiftError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            path: err.failed_path().map(str::to_string),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
    /// Entries processed before an aborted run stopped. Their writes are
    /// already on disk.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completed: Vec<PassReport>,
}

impl ErrorResponse {
    pub fn from_error(err: &ShiftError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
            completed: Vec::new(),
        }
    }

    /// Attach the outcomes produced before the error.
    pub fn with_completed(mut self, completed: Vec<PassReport>) -> Self {
        self.completed = completed;
        self
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
