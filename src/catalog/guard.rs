//! Path safety guard
//!
//! Tracks the canonical directories open on the current traversal path so a
//! symlink pointing back at an ancestor is detected instead of followed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfError};

/// Set of canonical directories between the root and the current frame.
///
/// Entries are removed when their subtree is finished, so the same physical
/// directory reached through two sibling links is visited twice. Only
/// ancestor recurrence counts as a cycle.
#[derive(Debug, Default)]
pub struct PathGuard {
    open: HashSet<PathBuf>,
}

impl PathGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `dir` and mark it open.
    ///
    /// Fails with `Unreadable` when the path cannot be resolved and with
    /// `CycleDetected` when its real path is already open above us.
    pub fn enter(&mut self, dir: &Path) -> Result<PathBuf> {
        let canonical = std::fs::canonicalize(dir).map_err(|e| ShelfError::unreadable(dir, e))?;
        if self.open.contains(&canonical) {
            return Err(ShelfError::CycleDetected { path: canonical });
        }
        self.open.insert(canonical.clone());
        Ok(canonical)
    }

    /// Close a directory previously returned by `enter`.
    pub fn leave(&mut self, canonical: &Path) {
        self.open.remove(canonical);
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.open.len()
    }
}
