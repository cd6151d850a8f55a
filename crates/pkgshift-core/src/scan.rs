//! Residual reference scan.
//!
//! Walks the tree and reports, per file, which rule patterns still occur.
//! After a partial migration this is the list of files that still point
//! at old packages.

use std::fs;
use std::io;
use std::path::Path;

use globset::Glob;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ShiftError, ShiftResult};
use crate::rules::RuleTable;

/// Default file selection for a scan.
pub const DEFAULT_INCLUDE: &str = "**/*.java";

/// A pattern still present in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidueMatch {
    /// Index of the first rule with this pattern.
    pub index: usize,
    pub pattern: String,
    pub occurrences: usize,
}

/// A file that still contains rule patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Residue {
    /// Root-relative, `/`-separated.
    pub path: String,
    pub matches: Vec<ResidueMatch>,
}

/// Scan `root` for files matching `include` that still contain any
/// non-inert pattern of `rules`.
///
/// Files that cannot be read as UTF-8 are skipped. Results are sorted by
/// path.
pub fn scan_residue(root: &Path, rules: &RuleTable, include: &str) -> ShiftResult<Vec<Residue>> {
    let matcher = Glob::new(include)
        .map_err(|e| ShiftError::invalid_args(format!("invalid glob '{}': {}", include, e)))?
        .compile_matcher();

    let mut patterns: Vec<(usize, &str)> = Vec::new();
    for (index, rule) in rules.iter().enumerate() {
        if !rule.is_inert() && !patterns.iter().any(|(_, p)| *p == rule.match_text) {
            patterns.push((index, rule.match_text.as_str()));
        }
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ShiftError::ReadFailure {
            path: e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string()),
            source: io::Error::from(e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ShiftError::internal(e.to_string()))?
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");
        if !matcher.is_match(&relative) {
            continue;
        }

        let content = match fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %relative, error = %e, "skipping unreadable file");
                continue;
            }
        };

        let matches: Vec<ResidueMatch> = patterns
            .iter()
            .filter_map(|&(index, pattern)| {
                let occurrences = content.matches(pattern).count();
                (occurrences > 0).then(|| ResidueMatch {
                    index,
                    pattern: pattern.to_string(),
                    occurrences,
                })
            })
            .collect();

        if !matches.is_empty() {
            found.push(Residue {
                path: relative,
                matches,
            });
        }
    }

    Ok(found)
}

// ============================================================================
// Tests
// ============================================================================
