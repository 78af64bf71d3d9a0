//! Tree state: which directories are expanded and where new files land.
//!
//! Pure in-memory state owned by one controller. Nothing here touches the
//! handle store.

use super::node::DirectoryNode;
use std::collections::HashSet;

/// Expanded set and current directory pointer over a tree snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeState {
    expanded: HashSet<String>,
    current_dir: Option<String>,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    /// Directory where a newly created file should land.
    pub fn current_dir(&self) -> Option<&str> {
        self.current_dir.as_deref()
    }

    /// Flip membership of `path` in the expanded set. Returns whether the
    /// path is expanded afterwards.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.to_string());
            true
        }
    }

    /// Expand every directory of `root`.
    pub fn expand_all<H>(&mut self, root: &DirectoryNode<H>) {
        self.expanded = root.directory_paths();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// A directory was clicked: it becomes the current directory. Toggling is
    /// left to the caller.
    pub fn on_directory_click<H>(&mut self, dir: &DirectoryNode<H>) {
        self.current_dir = Some(dir.path.clone());
    }

    /// Re-seed after a successful scan.
    ///
    /// The root is expanded; expanded paths that are still directories stay
    /// expanded. The current directory falls back to the root when unset or
    /// gone from the new tree.
    pub fn seed<H>(&mut self, root: &DirectoryNode<H>) {
        let directories = root.directory_paths();
        self.expanded.retain(|path| directories.contains(path));
        self.expanded.insert(root.path.clone());

        let keep_current = self
            .current_dir
            .as_ref()
            .map(|path| directories.contains(path))
            .unwrap_or(false);
        if !keep_current {
            self.current_dir = Some(root.path.clone());
        }
    }

    /// Forget everything, as at startup.
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.current_dir = None;
    }
}
