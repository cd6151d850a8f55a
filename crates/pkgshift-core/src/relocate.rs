//! Loading sources and persisting rewritten content.
//!
//! Relocation is copy-only: the source file is never deleted or renamed,
//! so a later phase can still read it. A missing source is an outcome,
//! not an error, and leaves the tree untouched.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ShiftError, ShiftResult};
use crate::manifest::parent_dir;
use crate::transform::TransformResult;
use crate::tree::SourceTree;

/// Why an entry was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The source path does not exist (yet).
    NotFound,
}

/// Result of one relocator operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocateOutcome {
    /// Content was written to the destination.
    Created(TransformResult),
    /// An in-place rewrite changed the file and it was written back.
    Updated(TransformResult),
    /// An in-place rewrite produced identical content; nothing was written.
    Unchanged(TransformResult),
    /// Nothing was read or written.
    Skipped(SkipReason),
}

impl RelocateOutcome {
    /// The transformation behind this outcome, if the source was read.
    pub fn result(&self) -> Option<&TransformResult> {
        match self {
            RelocateOutcome::Created(r)
            | RelocateOutcome::Updated(r)
            | RelocateOutcome::Unchanged(r) => Some(r),
            RelocateOutcome::Skipped(_) => None,
        }
    }
}

/// Moves content through a [`SourceTree`].
#[derive(Debug)]
pub struct Relocator<T: SourceTree> {
    tree: T,
}

impl<T: SourceTree> Relocator<T> {
    pub fn new(tree: T) -> Self {
        Relocator { tree }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    /// Read `path`, or `None` if it does not exist.
    pub fn load(&self, path: &str) -> ShiftResult<Option<String>> {
        if !self.tree.exists(path) {
            return Ok(None);
        }
        self.tree
            .read_to_string(path)
            .map(Some)
            .map_err(|source| ShiftError::ReadFailure {
                path: path.to_string(),
                source,
            })
    }

    /// Write `content` to `path`, creating parent directories first.
    pub fn persist(&mut self, path: &str, content: &str) -> ShiftResult<()> {
        let parent = parent_dir(path);
        if !parent.is_empty() {
            self.tree
                .create_dir_all(parent)
                .map_err(|source| ShiftError::WriteFailure {
                    path: parent.to_string(),
                    source,
                })?;
        }
        self.tree
            .write(path, content)
            .map_err(|source| ShiftError::WriteFailure {
                path: path.to_string(),
                source,
            })?;
        debug!(path, bytes = content.len(), "wrote file");
        Ok(())
    }

    /// Read `source`, rewrite it, and write the result to `dest`.
    ///
    /// Always writes when the source exists, even if the content did not
    /// change. When `source == dest` this is an in-place overwrite.
    pub fn relocate<F>(
        &mut self,
        source: &str,
        dest: &str,
        rewrite: F,
    ) -> ShiftResult<RelocateOutcome>
    where
        F: FnOnce(&str) -> TransformResult,
    {
        let Some(raw) = self.load(source)? else {
            debug!(source, "source not found, skipping");
            return Ok(RelocateOutcome::Skipped(SkipReason::NotFound));
        };
        let result = rewrite(&raw);
        self.persist(dest, &result.content_after)?;
        Ok(RelocateOutcome::Created(result))
    }

    /// Rewrite `path` in place, writing only if the content changed.
    pub fn rewrite_in_place<F>(&mut self, path: &str, rewrite: F) -> ShiftResult<RelocateOutcome>
    where
        F: FnOnce(&str) -> TransformResult,
    {
        let Some(raw) = self.load(path)? else {
            debug!(path, "file not found, skipping");
            return Ok(RelocateOutcome::Skipped(SkipReason::NotFound));
        };
        let result = rewrite(&raw);
        if !result.changed {
            return Ok(RelocateOutcome::Unchanged(result));
        }
        self.persist(path, &result.content_after)?;
        Ok(RelocateOutcome::Updated(result))
    }
}

// ============================================================================
// Tests
// ============================================================================
