//! Filesystem access for a source tree.
//!
//! All paths handed to a [`SourceTree`] are root-relative and
//! `/`-separated (see [`crate::manifest::normalize_path`]).
//!
//! - [`DiskTree`] reads and writes the real tree.
//! - [`OverlayTree`] reads through to disk but keeps writes in memory, so
//!   a dry run over several phases sees what earlier phases would have
//!   written.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read/write/mkdir primitives over a tree root.
pub trait SourceTree {
    /// True if `path` names an existing regular file.
    fn exists(&self, path: &str) -> bool;

    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &str) -> io::Result<String>;

    /// Create `path` and any missing parents. Existing directories are fine.
    fn create_dir_all(&mut self, path: &str) -> io::Result<()>;

    /// Overwrite (or create) `path` with `content`.
    fn write(&mut self, path: &str, content: &str) -> io::Result<()>;
}

// ============================================================================
// DiskTree
// ============================================================================

/// The real filesystem below `root`.
#[derive(Debug, Clone)]
pub struct DiskTree {
    root: PathBuf,
}

impl DiskTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskTree { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a root-relative path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl SourceTree for DiskTree {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn create_dir_all(&mut self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }

    fn write(&mut self, path: &str, content: &str) -> io::Result<()> {
        fs::write(self.resolve(path), content)
    }
}

// ============================================================================
// OverlayTree
// ============================================================================

/// A dry-run tree: disk reads, in-memory writes.
#[derive(Debug, Clone)]
pub struct OverlayTree {
    base: DiskTree,
    staged: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
}

impl OverlayTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OverlayTree {
            base: DiskTree::new(root),
            staged: BTreeMap::new(),
            dirs: BTreeSet::new(),
        }
    }

    /// The disk tree reads fall through to.
    pub fn base(&self) -> &DiskTree {
        &self.base
    }

    /// Writes captured so far, sorted by path. Later writes to the same
    /// path replace earlier ones.
    pub fn staged(&self) -> impl Iterator<Item = (&str, &str)> {
        self.staged.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Directories that would have been created and do not exist on disk.
    pub fn created_dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }
}

impl SourceTree for OverlayTree {
    fn exists(&self, path: &str) -> bool {
        self.staged.contains_key(path) || self.base.exists(path)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        match self.staged.get(path) {
            Some(content) => Ok(content.clone()),
            None => self.base.read_to_string(path),
        }
    }

    fn create_dir_all(&mut self, path: &str) -> io::Result<()> {
        if !self.base.resolve(path).is_dir() {
            self.dirs.insert(path.to_string());
        }
        Ok(())
    }

    fn write(&mut self, path: &str, content: &str) -> io::Result<()> {
        self.staged.insert(path.to_string(), content.to_string());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
