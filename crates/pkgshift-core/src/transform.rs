//! Content transformation for a single manifest entry.
//!
//! The transformer is pure: it never touches the filesystem and the same
//! `(content, entry)` pair always produces the same output.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::manifest::MigrationEntry;
use crate::rules::{RuleHit, RuleTable};

/// SHA-256 of file content, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output of transforming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub content_before: String,
    pub content_after: String,
    /// True iff `content_after` differs from `content_before`.
    pub changed: bool,
    /// Rules that fired, indexed into the entry's combined table.
    pub hits: Vec<RuleHit>,
}

impl TransformResult {
    pub fn before_hash(&self) -> ContentHash {
        ContentHash::compute(self.content_before.as_bytes())
    }

    pub fn after_hash(&self) -> ContentHash {
        ContentHash::compute(self.content_after.as_bytes())
    }
}

/// Applies an entry's rules to file content.
///
/// Holds the phase's shared (cross-cutting) rules; the entry's package
/// declaration rule is added per entry.
#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    shared: &'a RuleTable,
}

impl<'a> Transformer<'a> {
    pub fn new(shared: &'a RuleTable) -> Self {
        Transformer { shared }
    }

    /// The combined table for `entry`: its package declaration rule first,
    /// then every shared rule in order.
    pub fn rules_for(&self, entry: &MigrationEntry) -> RuleTable {
        let mut rules = RuleTable::default();
        if let Some(package) = entry.package() {
            rules.push(package.declaration_rule());
        }
        rules.extend(self.shared.iter().cloned());
        rules
    }

    /// Rewrite `raw` for `entry`.
    pub fn transform(&self, raw: &str, entry: &MigrationEntry) -> TransformResult {
        let (content_after, hits) = self.rules_for(entry).apply_traced(raw);
        let changed = content_after != raw;
        TransformResult {
            content_before: raw.to_string(),
            content_after,
            changed,
            hits,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
