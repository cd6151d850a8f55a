//! Migration entries and the manifest that orders them.
//!
//! Paths are root-relative and always stored with forward slashes. They
//! are normalised when an entry is built, and anything that could escape
//! the tree root is rejected.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ShiftError, ShiftResult};
use crate::rules::RewriteRule;

// ============================================================================
// Paths
// ============================================================================

/// Normalise a manifest path to a root-relative, `/`-separated form.
///
/// Backslashes become slashes, `.` and empty components are dropped.
/// Absolute paths, drive prefixes and `..` components are rejected.
pub fn normalize_path(raw: &str) -> ShiftResult<String> {
    let unified = raw.trim().replace('\\', "/");

    if unified.starts_with('/') {
        return Err(ShiftError::unsafe_path(
            raw,
            "absolute paths are not allowed",
        ));
    }
    let bytes = unified.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return Err(ShiftError::unsafe_path(
            raw,
            "drive-qualified paths are not allowed",
        ));
    }

    let mut parts = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                return Err(ShiftError::unsafe_path(raw, "'..' escapes the tree root"));
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return Err(ShiftError::unsafe_path(raw, "path is empty"));
    }
    Ok(parts.join("/"))
}

/// Parent directory of a normalised path, `""` for top-level files.
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

// ============================================================================
// Entries
// ============================================================================

/// The package a relocated file is declared in before and after the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMove {
    pub old: String,
    pub new: String,
}

impl PackageMove {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        PackageMove {
            old: old.into(),
            new: new.into(),
        }
    }

    /// The `package <old>;` → `package <new>;` rule for this move.
    pub fn declaration_rule(&self) -> RewriteRule {
        RewriteRule::package_declaration(&self.old, &self.new)
    }
}

/// How an entry is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Has a package pair. Always written to its destination.
    Relocation,
    /// No package pair, source == dest. Written back only when changed.
    ImportFixup,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Relocation => write!(f, "relocation"),
            EntryKind::ImportFixup => write!(f, "import_fixup"),
        }
    }
}

/// One file to process in a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationEntry {
    source_path: String,
    dest_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<PackageMove>,
}

impl MigrationEntry {
    /// An entry that copies `source` to `dest` and redeclares its package.
    ///
    /// `source` and `dest` may be equal, in which case the file is
    /// rewritten in place.
    pub fn relocation(
        source: &str,
        dest: &str,
        old_package: impl Into<String>,
        new_package: impl Into<String>,
    ) -> ShiftResult<Self> {
        Ok(MigrationEntry {
            source_path: normalize_path(source)?,
            dest_path: normalize_path(dest)?,
            package: Some(PackageMove::new(old_package, new_package)),
        })
    }

    /// An entry that repairs imports in `path` without moving it.
    pub fn fixup(path: &str) -> ShiftResult<Self> {
        let path = normalize_path(path)?;
        Ok(MigrationEntry {
            source_path: path.clone(),
            dest_path: path,
            package: None,
        })
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn dest_path(&self) -> &str {
        &self.dest_path
    }

    pub fn package(&self) -> Option<&PackageMove> {
        self.package.as_ref()
    }

    pub fn kind(&self) -> EntryKind {
        if self.package.is_some() {
            EntryKind::Relocation
        } else {
            EntryKind::ImportFixup
        }
    }

    /// True if the entry writes back to the file it reads.
    pub fn is_in_place(&self) -> bool {
        self.source_path == self.dest_path
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// Ordered entries for one pass. Order is processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<MigrationEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<MigrationEntry>) -> Self {
        Manifest { entries }
    }

    pub fn push(&mut self, entry: MigrationEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MigrationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }

    /// Destination paths written by more than one entry, in sorted order.
    pub fn duplicate_destinations(&self) -> Vec<String> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &self.entries {
            *seen.entry(entry.dest_path()).or_default() += 1;
        }
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(path, _)| path.to_string())
            .collect()
    }
}

impl FromIterator<MigrationEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = MigrationEntry>>(iter: I) -> Self {
        Manifest {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a MigrationEntry;
    type IntoIter = std::slice::Iter<'a, MigrationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
