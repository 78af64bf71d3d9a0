//! Directory Scanner
//!
//! Recursively walks a directory handle through the capability provider and
//! builds a [`DirectoryNode`] tree. Subdirectories are scanned before they are
//! appended to their parent; entries keep the provider's order.

use super::node::{join_path, DirectoryNode, FileNode, Node};
use crate::capability::{CapabilityHandle, CapabilityProvider};
use crate::error::{CapabilityError, ScanError};
use crate::types::EntryKind;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// What to do when a subdirectory cannot be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanErrorPolicy {
    /// Abort the scan with the subtree's error.
    #[default]
    Fail,
    /// Leave the subtree out and record it in [`ScanReport::failures`].
    Skip,
}

/// Scan result: the tree plus any subtrees left out under `ScanErrorPolicy::Skip`.
#[derive(Debug)]
pub struct ScanReport<H> {
    pub root: DirectoryNode<H>,
    pub failures: Vec<ScanError>,
}

impl<H> ScanReport<H> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Directory scanner over a capability provider.
pub struct DirectoryScanner<'a, P> {
    provider: &'a P,
    policy: ScanErrorPolicy,
}

impl<'a, P: CapabilityProvider> DirectoryScanner<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            policy: ScanErrorPolicy::Fail,
        }
    }

    pub fn with_policy(mut self, policy: ScanErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Scan the tree below `root`. The root's path is its own name.
    ///
    /// A root that cannot be listed is always an error, whatever the policy.
    pub async fn scan(&self, root: &P::Handle) -> Result<ScanReport<P::Handle>, ScanError> {
        if root.kind() != EntryKind::Directory {
            return Err(ScanError {
                path: root.name().to_string(),
                source: CapabilityError::NotADirectory(root.name().to_string()),
            });
        }
        let name = root.name().to_string();
        let mut failures = Vec::new();
        let tree = self
            .scan_directory(root.clone(), name.clone(), name, &mut failures)
            .await?;
        info!(
            root = %tree.path,
            nodes = tree.node_count(),
            skipped = failures.len(),
            "Directory scan finished"
        );
        Ok(ScanReport {
            root: tree,
            failures,
        })
    }

    fn scan_directory<'s>(
        &'s self,
        handle: P::Handle,
        name: String,
        path: String,
        failures: &'s mut Vec<ScanError>,
    ) -> BoxFuture<'s, Result<DirectoryNode<P::Handle>, ScanError>> {
        async move {
            let entries = self
                .provider
                .list_entries(&handle)
                .await
                .map_err(|source| ScanError {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path, entries = entries.len(), "Listed directory");

            let mut seen = HashSet::with_capacity(entries.len());
            let mut children = Vec::with_capacity(entries.len());
            for entry in entries {
                let child_path = join_path(&path, &entry.name);
                if !seen.insert(entry.name.clone()) {
                    return Err(ScanError {
                        path: child_path,
                        source: CapabilityError::DuplicateEntry(entry.name),
                    });
                }
                match entry.kind {
                    EntryKind::File => children.push(Node::File(FileNode {
                        name: entry.name,
                        path: child_path,
                        handle: entry.handle,
                    })),
                    EntryKind::Directory => {
                        let scanned = self
                            .scan_directory(entry.handle, entry.name, child_path, &mut *failures)
                            .await;
                        match scanned {
                            Ok(dir) => children.push(Node::Directory(dir)),
                            Err(err) if self.policy == ScanErrorPolicy::Skip => {
                                warn!(path = %err.path, error = %err.source, "Skipping unreadable subtree");
                                failures.push(err);
                            }
                            Err(err) => return Err(err),
                        }
                    }
                }
            }

            Ok(DirectoryNode {
                name,
                path,
                handle,
                children,
            })
        }
        .boxed()
    }
}
