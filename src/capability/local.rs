//! Local filesystem capability provider.
//!
//! Handles are plain paths. "Picking" a directory means the CLI was given
//! one explicitly; re-opening a persisted root can be gated behind an
//! interactive confirmation so reloads behave like a host that re-prompts.
//! Symbolic links are listed as files and never followed by a listing.

use super::{CapabilityHandle, CapabilityProvider, DirEntry};
use crate::error::CapabilityError;
use crate::types::{EntryKind, PermissionState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Handle to a local filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalHandle {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

impl LocalHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CapabilityHandle for LocalHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn map_io_error(path: &Path, err: std::io::Error) -> CapabilityError {
    let display = path.display().to_string();
    match err.kind() {
        ErrorKind::NotFound => CapabilityError::NotFound(display),
        ErrorKind::PermissionDenied => CapabilityError::PermissionDenied(display),
        _ => CapabilityError::Io {
            path: display,
            source: err,
        },
    }
}

/// Capability provider over the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalCapabilityProvider {
    pick_target: Option<PathBuf>,
    confirm_on_restore: bool,
    interactive: bool,
}

impl LocalCapabilityProvider {
    pub fn new() -> Self {
        Self {
            pick_target: None,
            confirm_on_restore: false,
            interactive: false,
        }
    }

    /// Directory returned by the next `pick_directory`.
    pub fn with_pick_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.pick_target = Some(target.into());
        self
    }

    /// Report `Prompt` for readable directories so restores ask first.
    pub fn with_confirm_on_restore(mut self, confirm: bool) -> Self {
        self.confirm_on_restore = confirm;
        self
    }

    /// Allow permission prompts on the terminal. Without it every prompt is
    /// answered with `Denied`.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    async fn readable(path: &Path) -> Result<(), CapabilityError> {
        tokio::fs::read_dir(path)
            .await
            .map(|_| ())
            .map_err(|e| map_io_error(path, e))
    }

    async fn confirm(path: PathBuf) -> PermissionState {
        let prompt = format!("Allow read access to {}?", path.display());
        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(true)
                .interact()
        })
        .await;
        match answer {
            Ok(Ok(true)) => PermissionState::Granted,
            Ok(Ok(false)) => PermissionState::Denied,
            Ok(Err(e)) => {
                warn!(error = %e, "Permission prompt failed");
                PermissionState::Denied
            }
            Err(e) => {
                warn!(error = %e, "Permission prompt task failed");
                PermissionState::Denied
            }
        }
    }
}

impl Default for LocalCapabilityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for LocalCapabilityProvider {
    type Handle = LocalHandle;

    async fn pick_directory(&self) -> Result<LocalHandle, CapabilityError> {
        let target = self.pick_target.as_ref().ok_or(CapabilityError::Cancelled)?;
        let path = dunce::canonicalize(target).map_err(|e| map_io_error(target, e))?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_io_error(&path, e))?;
        if !metadata.is_dir() {
            return Err(CapabilityError::NotADirectory(path.display().to_string()));
        }
        Ok(LocalHandle {
            name: entry_name(&path),
            path,
            kind: EntryKind::Directory,
        })
    }

    async fn list_entries(
        &self,
        dir: &LocalHandle,
    ) -> Result<Vec<DirEntry<LocalHandle>>, CapabilityError> {
        let mut reader = tokio::fs::read_dir(&dir.path)
            .await
            .map_err(|e| map_io_error(&dir.path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| map_io_error(&dir.path, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| map_io_error(&path, e))?;
            // Symlinks are never descended into, so the tree stays acyclic.
            if file_type.is_symlink() {
                debug!(path = %path.display(), "Listing symlink as a file");
            }
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let name = entry.file_name().to_string_lossy().to_string();
            entries.push(DirEntry {
                name: name.clone(),
                kind,
                handle: LocalHandle { name, path, kind },
            });
        }
        Ok(entries)
    }

    async fn query_permission(
        &self,
        handle: &LocalHandle,
    ) -> Result<PermissionState, CapabilityError> {
        match Self::readable(&handle.path).await {
            Ok(()) if self.confirm_on_restore => Ok(PermissionState::Prompt),
            Ok(()) => Ok(PermissionState::Granted),
            Err(CapabilityError::PermissionDenied(_)) => Ok(PermissionState::Denied),
            Err(e) => Err(e),
        }
    }

    async fn request_permission(
        &self,
        handle: &LocalHandle,
    ) -> Result<PermissionState, CapabilityError> {
        match Self::readable(&handle.path).await {
            Ok(()) => {}
            Err(CapabilityError::PermissionDenied(_)) => return Ok(PermissionState::Denied),
            Err(e) => return Err(e),
        }
        if !self.interactive {
            return Ok(PermissionState::Denied);
        }
        Ok(Self::confirm(handle.path.clone()).await)
    }

    async fn read_file(&self, file: &LocalHandle) -> Result<Vec<u8>, CapabilityError> {
        tokio::fs::read(&file.path)
            .await
            .map_err(|e| map_io_error(&file.path, e))
    }

    async fn write_file(&self, file: &LocalHandle, contents: &[u8]) -> Result<(), CapabilityError> {
        let metadata = tokio::fs::metadata(&file.path)
            .await
            .map_err(|e| map_io_error(&file.path, e))?;
        if !metadata.is_file() {
            return Err(CapabilityError::NotAFile(file.path.display().to_string()));
        }
        tokio::fs::write(&file.path, contents)
            .await
            .map_err(|e| map_io_error(&file.path, e))
    }

    async fn create_file(
        &self,
        dir: &LocalHandle,
        name: &str,
        contents: &[u8],
    ) -> Result<LocalHandle, CapabilityError> {
        let path = dir.path.join(name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => CapabilityError::AlreadyExists(name.to_string()),
                _ => map_io_error(&path, e),
            })?;
        file.write_all(contents)
            .await
            .map_err(|e| map_io_error(&path, e))?;
        file.flush().await.map_err(|e| map_io_error(&path, e))?;
        Ok(LocalHandle {
            name: name.to_string(),
            path,
            kind: EntryKind::File,
        })
    }
}
