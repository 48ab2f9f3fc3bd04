//! Directory tree reconstruction from layout events.
//!
//! Computes the minimal set of directories the installer has to know about
//! and which of them hold no files. Empty directories need an explicit
//! creation component; the others come into existence with their files.

use super::path::WixPath;
use crate::bundler::error::Result;
use crate::bundler::layout::LayoutEvent;
use std::collections::BTreeSet;

/// Every directory implied by a layout, and the empty subset.
#[derive(Clone, Debug, Default)]
pub struct DirectoryTree {
    all: BTreeSet<WixPath>,
    empty: BTreeSet<WixPath>,
}

impl DirectoryTree {
    /// Builds the tree from a complete event sequence. Order does not matter.
    pub fn from_events<I>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = LayoutEvent>,
    {
        let mut tree = Self::default();
        for event in events {
            tree.apply(&event)?;
        }
        Ok(tree)
    }

    /// Feeds a single event.
    pub fn apply(&mut self, event: &LayoutEvent) -> Result<()> {
        match event {
            LayoutEvent::CopyFile { dst, .. } => self.copy_file(dst),
            LayoutEvent::EnsureDirectory(dir) => self.ensure_directory(dir),
        }
    }

    /// Records `dir` and its ancestors.
    ///
    /// A new directory starts out empty. Insertion walks ancestors only until
    /// the first one already known; every ancestor then stops being empty
    /// because it now has a descendant.
    pub fn ensure_directory(&mut self, dir: &WixPath) -> Result<()> {
        dir.validate()?;

        if !self.all.contains(dir) {
            self.empty.insert(dir.clone());
        }

        let mut next = Some(dir.clone());
        while let Some(current) = next {
            next = current.parent();
            if !self.all.insert(current) {
                break;
            }
        }

        for ancestor in dir.ancestors() {
            self.empty.remove(&ancestor);
        }
        Ok(())
    }

    /// Records the parent directory of an installed file.
    pub fn copy_file(&mut self, dst: &WixPath) -> Result<()> {
        let dir = dst.parent().ok_or_else(|| dst.invalid())?;
        self.ensure_directory(&dir)?;
        self.empty.remove(&dir);
        Ok(())
    }

    /// All directories, sorted.
    pub fn directories(&self) -> impl Iterator<Item = &WixPath> + '_ {
        self.all.iter()
    }

    /// Directories without files or subdirectories, sorted.
    pub fn empty_directories(&self) -> impl Iterator<Item = &WixPath> + '_ {
        self.empty.iter()
    }

    /// Directories that receive content, sorted.
    pub fn populated_directories(&self) -> impl Iterator<Item = &WixPath> + '_ {
        self.all.iter().filter(|dir| !self.empty.contains(*dir))
    }

    /// `dir` followed by each of its ancestors up to the root directory.
    pub fn ancestor_chain(&self, dir: &WixPath) -> Vec<WixPath> {
        std::iter::once(dir.clone())
            .chain(dir.ancestors())
            .filter(|d| self.all.contains(d))
            .collect()
    }
}
