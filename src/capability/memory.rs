//! In-memory capability provider.
//!
//! Holds a whole directory tree in memory and mimics the host's permission
//! model: listing and reading require a granted permission, picking a
//! directory grants it. Failure injection and call counters make it the
//! provider of choice for exercising the scanner and the session.

use super::{CapabilityHandle, CapabilityProvider, DirEntry};
use crate::error::CapabilityError;
use crate::types::{EntryKind, PermissionState};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Handle to an entry of a [`MemoryCapabilityProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryHandle {
    id: u64,
    name: String,
    kind: EntryKind,
}

impl CapabilityHandle for MemoryHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }
}

#[derive(Debug)]
struct MemoryEntry {
    name: String,
    kind: EntryKind,
    children: Vec<u64>,
    contents: Vec<u8>,
}

#[derive(Debug)]
struct MemoryState {
    next_id: u64,
    entries: HashMap<u64, MemoryEntry>,
    permission: PermissionState,
    request_response: PermissionState,
    failing_listings: HashSet<u64>,
    failing_reads: HashSet<u64>,
    pick_cancelled: bool,
    permission_requests: usize,
    listings: usize,
    reads: usize,
}

impl MemoryState {
    fn handle(&self, id: u64) -> Option<MemoryHandle> {
        self.entries.get(&id).map(|entry| MemoryHandle {
            id,
            name: entry.name.clone(),
            kind: entry.kind,
        })
    }

    fn child_named(&self, parent: u64, name: &str) -> Option<u64> {
        self.entries.get(&parent).and_then(|entry| {
            entry
                .children
                .iter()
                .copied()
                .find(|child| self.entries.get(child).map(|c| c.name.as_str()) == Some(name))
        })
    }

    fn insert_child(&mut self, parent: u64, name: &str, kind: EntryKind, contents: Vec<u8>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            MemoryEntry {
                name: name.to_string(),
                kind,
                children: Vec::new(),
                contents,
            },
        );
        if let Some(parent) = self.entries.get_mut(&parent) {
            parent.children.push(id);
        }
        id
    }

    /// Resolve a root-relative `/`-separated path. The empty path is the root.
    fn resolve(&self, root: u64, path: &str) -> Option<u64> {
        let mut current = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_named(current, segment)?;
        }
        Some(current)
    }

    fn ensure_dirs(&mut self, root: u64, segments: &[&str]) -> u64 {
        let mut current = root;
        for segment in segments {
            current = match self.child_named(current, segment) {
                Some(id) => id,
                None => self.insert_child(current, segment, EntryKind::Directory, Vec::new()),
            };
        }
        current
    }
}

/// Capability provider backed by an in-memory tree.
#[derive(Debug)]
pub struct MemoryCapabilityProvider {
    root: u64,
    state: RwLock<MemoryState>,
}

impl MemoryCapabilityProvider {
    /// Create a provider whose root directory is called `root_name`.
    ///
    /// Permission starts out as `Prompt` and a prompt is answered with `Granted`.
    pub fn new(root_name: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            0,
            MemoryEntry {
                name: root_name.to_string(),
                kind: EntryKind::Directory,
                children: Vec::new(),
                contents: Vec::new(),
            },
        );
        Self {
            root: 0,
            state: RwLock::new(MemoryState {
                next_id: 1,
                entries,
                permission: PermissionState::Prompt,
                request_response: PermissionState::Granted,
                failing_listings: HashSet::new(),
                failing_reads: HashSet::new(),
                pick_cancelled: false,
                permission_requests: 0,
                listings: 0,
                reads: 0,
            }),
        }
    }

    pub fn root_handle(&self) -> MemoryHandle {
        MemoryHandle {
            id: self.root,
            name: self.state.read().entries[&self.root].name.clone(),
            kind: EntryKind::Directory,
        }
    }

    /// Create a directory (and any missing parents) at a root-relative path.
    pub fn add_dir(&self, path: &str) -> MemoryHandle {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut state = self.state.write();
        let id = state.ensure_dirs(self.root, &segments);
        MemoryHandle {
            id,
            name: state.entries[&id].name.clone(),
            kind: EntryKind::Directory,
        }
    }

    /// Create or replace a file at a root-relative path, creating parents.
    pub fn add_file(&self, path: &str, contents: impl Into<Vec<u8>>) -> MemoryHandle {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (name, parents) = match segments.split_last() {
            Some((name, parents)) => (*name, parents),
            None => ("", &[][..]),
        };
        let contents = contents.into();
        let mut state = self.state.write();
        let parent = state.ensure_dirs(self.root, parents);
        let id = match state.child_named(parent, name) {
            Some(id) => {
                if let Some(entry) = state.entries.get_mut(&id) {
                    entry.contents = contents;
                }
                id
            }
            None => state.insert_child(parent, name, EntryKind::File, contents),
        };
        MemoryHandle {
            id,
            name: name.to_string(),
            kind: EntryKind::File,
        }
    }

    /// Remove an entry and its subtree. Outstanding handles become dangling.
    pub fn remove(&self, path: &str) {
        let mut state = self.state.write();
        let Some(id) = state.resolve(self.root, path) else {
            return;
        };
        if id == self.root {
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entry) = state.entries.remove(&current) {
                stack.extend(entry.children);
            }
        }
        for entry in state.entries.values_mut() {
            entry.children.retain(|child| *child != id);
        }
    }

    /// Current contents of a file, if it exists.
    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.state.read();
        let id = state.resolve(self.root, path)?;
        state
            .entries
            .get(&id)
            .filter(|entry| entry.kind == EntryKind::File)
            .map(|entry| entry.contents.clone())
    }

    pub fn set_permission(&self, permission: PermissionState) {
        self.state.write().permission = permission;
    }

    /// Answer given to the next permission prompts.
    pub fn set_request_response(&self, response: PermissionState) {
        self.state.write().request_response = response;
    }

    /// Make listing the directory at `path` fail with an I/O error.
    pub fn fail_listing(&self, path: &str) {
        let mut state = self.state.write();
        if let Some(id) = state.resolve(self.root, path) {
            state.failing_listings.insert(id);
        }
    }

    /// Make reading the file at `path` fail with an I/O error.
    pub fn fail_read(&self, path: &str) {
        let mut state = self.state.write();
        if let Some(id) = state.resolve(self.root, path) {
            state.failing_reads.insert(id);
        }
    }

    /// Make the directory picker behave as if the user dismissed it.
    pub fn cancel_picker(&self, cancelled: bool) {
        self.state.write().pick_cancelled = cancelled;
    }

    pub fn permission_requests(&self) -> usize {
        self.state.read().permission_requests
    }

    pub fn listing_count(&self) -> usize {
        self.state.read().listings
    }

    pub fn read_count(&self) -> usize {
        self.state.read().reads
    }

    fn check_granted(state: &MemoryState, name: &str) -> Result<(), CapabilityError> {
        if state.permission == PermissionState::Granted {
            Ok(())
        } else {
            Err(CapabilityError::PermissionDenied(name.to_string()))
        }
    }

    fn injected_failure(name: &str) -> CapabilityError {
        CapabilityError::Io {
            path: name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
        }
    }
}

#[async_trait]
impl CapabilityProvider for MemoryCapabilityProvider {
    type Handle = MemoryHandle;

    async fn pick_directory(&self) -> Result<MemoryHandle, CapabilityError> {
        let mut state = self.state.write();
        if state.pick_cancelled {
            return Err(CapabilityError::Cancelled);
        }
        state.permission = PermissionState::Granted;
        state
            .handle(self.root)
            .ok_or_else(|| CapabilityError::NotFound("root".to_string()))
    }

    async fn list_entries(
        &self,
        dir: &MemoryHandle,
    ) -> Result<Vec<DirEntry<MemoryHandle>>, CapabilityError> {
        let mut state = self.state.write();
        state.listings += 1;
        Self::check_granted(&state, &dir.name)?;
        if state.failing_listings.contains(&dir.id) {
            return Err(Self::injected_failure(&dir.name));
        }
        let entry = state
            .entries
            .get(&dir.id)
            .ok_or_else(|| CapabilityError::NotFound(dir.name.clone()))?;
        if entry.kind != EntryKind::Directory {
            return Err(CapabilityError::NotADirectory(dir.name.clone()));
        }
        Ok(entry
            .children
            .iter()
            .filter_map(|child| state.handle(*child))
            .map(|handle| DirEntry {
                name: handle.name.clone(),
                kind: handle.kind,
                handle,
            })
            .collect())
    }

    async fn query_permission(
        &self,
        handle: &MemoryHandle,
    ) -> Result<PermissionState, CapabilityError> {
        let state = self.state.read();
        if !state.entries.contains_key(&handle.id) {
            return Err(CapabilityError::NotFound(handle.name.clone()));
        }
        Ok(state.permission)
    }

    async fn request_permission(
        &self,
        handle: &MemoryHandle,
    ) -> Result<PermissionState, CapabilityError> {
        let mut state = self.state.write();
        state.permission_requests += 1;
        if !state.entries.contains_key(&handle.id) {
            return Err(CapabilityError::NotFound(handle.name.clone()));
        }
        let response = state.request_response;
        if response == PermissionState::Granted {
            state.permission = PermissionState::Granted;
        }
        Ok(response)
    }

    async fn read_file(&self, file: &MemoryHandle) -> Result<Vec<u8>, CapabilityError> {
        let mut state = self.state.write();
        state.reads += 1;
        Self::check_granted(&state, &file.name)?;
        if state.failing_reads.contains(&file.id) {
            return Err(Self::injected_failure(&file.name));
        }
        let entry = state
            .entries
            .get(&file.id)
            .ok_or_else(|| CapabilityError::NotFound(file.name.clone()))?;
        if entry.kind != EntryKind::File {
            return Err(CapabilityError::NotAFile(file.name.clone()));
        }
        Ok(entry.contents.clone())
    }

    async fn write_file(&self, file: &MemoryHandle, contents: &[u8]) -> Result<(), CapabilityError> {
        let mut state = self.state.write();
        Self::check_granted(&state, &file.name)?;
        let entry = state
            .entries
            .get_mut(&file.id)
            .ok_or_else(|| CapabilityError::NotFound(file.name.clone()))?;
        if entry.kind != EntryKind::File {
            return Err(CapabilityError::NotAFile(file.name.clone()));
        }
        entry.contents = contents.to_vec();
        Ok(())
    }

    async fn create_file(
        &self,
        dir: &MemoryHandle,
        name: &str,
        contents: &[u8],
    ) -> Result<MemoryHandle, CapabilityError> {
        let mut state = self.state.write();
        Self::check_granted(&state, &dir.name)?;
        match state.entries.get(&dir.id) {
            None => return Err(CapabilityError::NotFound(dir.name.clone())),
            Some(entry) if entry.kind != EntryKind::Directory => {
                return Err(CapabilityError::NotADirectory(dir.name.clone()))
            }
            Some(_) => {}
        }
        if state.child_named(dir.id, name).is_some() {
            return Err(CapabilityError::AlreadyExists(name.to_string()));
        }
        let id = state.insert_child(dir.id, name, EntryKind::File, contents.to_vec());
        Ok(MemoryHandle {
            id,
            name: name.to_string(),
            kind: EntryKind::File,
        })
    }
}
