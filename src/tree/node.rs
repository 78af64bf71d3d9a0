//! Tree node types and snapshot
//!
//! A scan produces a [`TreeSnapshot`]: an immutable root directory plus the
//! time it was produced. Paths are root-relative, `/`-joined, and start with
//! the root's own name.

use crate::types::EntryKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Join a parent path and a child name.
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{}/{}", parent, name)
}

/// File node representation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNode<H> {
    pub name: String,
    pub path: String,
    #[serde(skip)]
    pub handle: H,
}

/// Directory node representation
///
/// Children are kept in the order the capability provider listed them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryNode<H> {
    pub name: String,
    pub path: String,
    #[serde(skip)]
    pub handle: H,
    pub children: Vec<Node<H>>,
}

/// Tree node: a directory or a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node<H> {
    Directory(DirectoryNode<H>),
    File(FileNode<H>),
}

impl<H> Node<H> {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => &dir.name,
            Node::File(file) => &file.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::Directory(dir) => &dir.path,
            Node::File(file) => &file.path,
        }
    }

    pub fn handle(&self) -> &H {
        match self {
            Node::Directory(dir) => &dir.handle,
            Node::File(file) => &file.handle,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Node::Directory(_) => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode<H>> {
        match self {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode<H>> {
        match self {
            Node::File(file) => Some(file),
            Node::Directory(_) => None,
        }
    }
}

impl<H> DirectoryNode<H> {
    /// Direct subdirectories, in scan order.
    pub fn subdirectories(&self) -> impl Iterator<Item = &DirectoryNode<H>> {
        self.children.iter().filter_map(Node::as_directory)
    }

    /// Direct files, in scan order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode<H>> {
        self.children.iter().filter_map(Node::as_file)
    }

    /// This directory and every directory below it, depth-first pre-order.
    pub fn directories(&self) -> Directories<'_, H> {
        Directories { stack: vec![self] }
    }

    /// Paths of this directory and every directory below it.
    pub fn directory_paths(&self) -> HashSet<String> {
        self.directories().map(|dir| dir.path.clone()).collect()
    }

    /// Look a directory up by its full path.
    pub fn find_directory(&self, path: &str) -> Option<&DirectoryNode<H>> {
        if path == self.path {
            return Some(self);
        }
        let rest = path.strip_prefix(self.path.as_str())?.strip_prefix('/')?;
        let mut current = self;
        for segment in rest.split('/') {
            current = current.subdirectories().find(|dir| dir.name == segment)?;
        }
        Some(current)
    }

    /// First file named exactly `name`, searching depth-first in scan order.
    pub fn find_file_by_name(&self, name: &str) -> Option<&FileNode<H>> {
        for child in &self.children {
            match child {
                Node::File(file) if file.name == name => return Some(file),
                Node::File(_) => {}
                Node::Directory(dir) => {
                    if let Some(found) = dir.find_file_by_name(name) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Total number of nodes in this subtree, including this directory.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| match child {
                Node::Directory(dir) => dir.node_count(),
                Node::File(_) => 1,
            })
            .sum::<usize>()
    }

    /// Every `(path, kind)` pair of the subtree in pre-order. Two scans of
    /// an unchanged directory structure produce the same outline.
    pub fn outline(&self) -> Vec<(String, EntryKind)> {
        let mut out = vec![(self.path.clone(), EntryKind::Directory)];
        for child in &self.children {
            match child {
                Node::Directory(dir) => out.extend(dir.outline()),
                Node::File(file) => out.push((file.path.clone(), EntryKind::File)),
            }
        }
        out
    }
}

/// Pre-order iterator over the directories of a subtree.
pub struct Directories<'a, H> {
    stack: Vec<&'a DirectoryNode<H>>,
}

impl<'a, H> Iterator for Directories<'a, H> {
    type Item = &'a DirectoryNode<H>;

    fn next(&mut self) -> Option<Self::Item> {
        let dir = self.stack.pop()?;
        let subdirs: Vec<&'a DirectoryNode<H>> = dir.subdirectories().collect();
        self.stack.extend(subdirs.into_iter().rev());
        Some(dir)
    }
}

/// One immutable scan result.
///
/// Cloning is cheap and clones share the same tree; a re-scan builds a new
/// snapshot instead of touching this one.
#[derive(Debug, Clone)]
pub struct TreeSnapshot<H> {
    root: Arc<DirectoryNode<H>>,
    scanned_at: DateTime<Utc>,
}

impl<H> TreeSnapshot<H> {
    pub fn new(root: DirectoryNode<H>) -> Self {
        Self {
            root: Arc::new(root),
            scanned_at: Utc::now(),
        }
    }

    pub fn root(&self) -> &DirectoryNode<H> {
        &self.root
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// Whether both snapshots share the same underlying tree.
    pub fn same_tree(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(parent: &str, name: &str) -> Node<()> {
        Node::File(FileNode {
            name: name.to_string(),
            path: join_path(parent, name),
            handle: (),
        })
    }

    fn dir(parent: Option<&str>, name: &str, children: Vec<Node<()>>) -> DirectoryNode<()> {
        DirectoryNode {
            name: name.to_string(),
            path: parent
                .map(|p| join_path(p, name))
                .unwrap_or_else(|| name.to_string()),
            handle: (),
            children,
        }
    }

    fn sample() -> DirectoryNode<()> {
        let inner = dir(Some("root/a"), "b", vec![file("root/a/b", "deep.txt")]);
        let a = dir(Some("root"), "a", vec![Node::Directory(inner), file("root/a", "x.json")]);
        let c = dir(Some("root"), "c", vec![]);
        dir(None, "root", vec![Node::Directory(a), file("root", "top.txt"), Node::Directory(c)])
    }

    #[test]
    fn test_directories_pre_order() {
        let root = sample();
        let paths: Vec<&str> = root.directories().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["root", "root/a", "root/a/b", "root/c"]);
    }

    #[test]
    fn test_find_directory_by_path() {
        let root = sample();
        assert_eq!(root.find_directory("root").unwrap().name, "root");
        assert_eq!(root.find_directory("root/a/b").unwrap().name, "b");
        assert!(root.find_directory("root/a/x.json").is_none());
        assert!(root.find_directory("other/a").is_none());
        assert!(root.find_directory("rootx").is_none());
    }

    #[test]
    fn test_find_file_by_name_depth_first() {
        let root = sample();
        assert_eq!(
            root.find_file_by_name("deep.txt").unwrap().path,
            "root/a/b/deep.txt"
        );
        assert!(root.find_file_by_name("missing").is_none());
    }

    #[test]
    fn test_node_count_and_outline() {
        let root = sample();
        assert_eq!(root.node_count(), 7);
        let outline = root.outline();
        assert_eq!(outline.len(), 7);
        assert_eq!(outline[0], ("root".to_string(), EntryKind::Directory));
        assert_eq!(outline[3], ("root/a/b/deep.txt".to_string(), EntryKind::File));
    }

    #[test]
    fn test_snapshot_clones_share_tree() {
        let snapshot = TreeSnapshot::new(sample());
        let clone = snapshot.clone();
        assert!(snapshot.same_tree(&clone));
        assert!(!snapshot.same_tree(&TreeSnapshot::new(sample())));
    }
}
