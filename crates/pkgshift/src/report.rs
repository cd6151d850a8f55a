//! Human-readable console output.
//!
//! [`TextReporter`] prints one line per entry as the orchestrator produces
//! it, so a long pass shows progress and a failed pass still shows what was
//! done before the failure.

use std::io::{self, Write};

use tracing::warn;

use pkgshift_core::orchestrator::{EntryOutcome, EntryReport, PassReport, Reporter, Summary};
use pkgshift_core::output::{CheckResponse, FileDiff, PhasesResponse};
use pkgshift_core::plan::Severity;
use pkgshift_core::scan::Residue;

/// Streams entry and pass lines to a writer.
///
/// Reporting cannot fail the run, so the first write error is logged and
/// held until [`TextReporter::finish`]. Later lines are dropped.
pub struct TextReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        TextReporter { out, error: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Flush and return the writer, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", line) {
            warn!(error = %e, "failed to write report");
            self.error = Some(e);
        }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn entry(&mut self, _phase: &str, report: &EntryReport) {
        self.line(format_args!("{}", entry_line(report)));
    }

    fn pass_finished(&mut self, report: &PassReport) {
        self.line(format_args!(
            "Pass '{}': {}\n",
            report.phase,
            summary_text(&report.summary)
        ));
    }
}

/// The console line for one entry.
pub fn entry_line(report: &EntryReport) -> String {
    match report.outcome {
        EntryOutcome::Created => format!("✓ Created: {}", report.dest),
        EntryOutcome::Updated => format!("✓ Updated: {}", report.dest),
        EntryOutcome::Unchanged => format!("- No changes: {}", report.dest),
        EntryOutcome::NotFound => format!("✗ Source not found: {}", report.source),
    }
}

pub fn summary_text(summary: &Summary) -> String {
    format!(
        "{} created, {} updated, {} unchanged, {} not found",
        summary.created, summary.updated, summary.unchanged, summary.skipped
    )
}

/// Closing lines of a run: the overall summary and any previews.
pub fn write_run_footer(
    out: &mut impl Write,
    passes: usize,
    summary: &Summary,
    dry_run: bool,
    diffs: &[FileDiff],
) -> io::Result<()> {
    for diff in diffs {
        write!(out, "{}", diff.diff)?;
    }
    if !diffs.is_empty() {
        writeln!(out)?;
    }
    let noun = if passes == 1 { "pass" } else { "passes" };
    writeln!(out, "Done: {} {}, {}", passes, noun, summary_text(summary))?;
    if dry_run {
        writeln!(out, "Dry run: no files were written.")?;
    }
    Ok(())
}

pub fn write_check(out: &mut impl Write, response: &CheckResponse) -> io::Result<()> {
    for issue in &response.issues {
        writeln!(out, "{}", issue)?;
    }
    let count = |severity: Severity| {
        response
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    };
    writeln!(
        out,
        "{} errors, {} warnings",
        count(Severity::Error),
        count(Severity::Warning)
    )
}

pub fn write_scan(out: &mut impl Write, files: &[Residue]) -> io::Result<()> {
    for file in files {
        writeln!(out, "{}", file.path)?;
        for m in &file.matches {
            writeln!(
                out,
                "    rule {} '{}' x{}",
                m.index, m.pattern, m.occurrences
            )?;
        }
    }
    writeln!(out, "{} files with residual references", files.len())
}

pub fn write_phases(out: &mut impl Write, response: &PhasesResponse) -> io::Result<()> {
    writeln!(out, "root: {}", response.root)?;
    for phase in &response.phases {
        write!(
            out,
            "{}: {} rules, {} relocations, {} fixups",
            phase.name, phase.rules, phase.relocations, phase.fixups
        )?;
        match &phase.description {
            Some(description) => writeln!(out, " ({})", description)?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
