//! Case session
//!
//! The single owner of everything a running application knows about the
//! imported case directory: the root handle, the current tree snapshot, the
//! expanded set and current directory, and the status map. Consumers borrow
//! it; nothing here is global.

use crate::capability::{CapabilityHandle, CapabilityProvider};
use crate::cases::{self, AggregateReport, CaseDocument};
use crate::concurrency::{ScanCoordinator, ScanTicket};
use crate::error::{ApiError, CapabilityError, CaseFileError, ScanError};
use crate::permission::{NegotiationState, PermissionNegotiator};
use crate::store::{HandleStore, RootRecord};
use crate::tree::{
    join_path, DirectoryScanner, FileNode, ScanErrorPolicy, ScanReport, TreeSnapshot, TreeState,
};
use crate::types::{CaseStatus, StatusMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tunables of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub scan_policy: ScanErrorPolicy,
    pub max_concurrent_reads: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            scan_policy: ScanErrorPolicy::Fail,
            max_concurrent_reads: 8,
        }
    }
}

/// A scan that has been issued a ticket but not run yet.
///
/// Owns everything it needs, so it can be moved to another task.
pub struct PendingScan<P: CapabilityProvider> {
    provider: Arc<P>,
    root: P::Handle,
    policy: ScanErrorPolicy,
    ticket: ScanTicket,
}

impl<P: CapabilityProvider> PendingScan<P> {
    pub fn ticket(&self) -> ScanTicket {
        self.ticket
    }

    pub async fn run(self) -> ScanOutcome<P::Handle> {
        let result = DirectoryScanner::new(self.provider.as_ref())
            .with_policy(self.policy)
            .scan(&self.root)
            .await;
        ScanOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// Finished scan waiting to be applied.
pub struct ScanOutcome<H> {
    pub ticket: ScanTicket,
    pub result: Result<ScanReport<H>, ScanError>,
}

/// Explicit application state over one capability provider.
pub struct CaseSession<P: CapabilityProvider> {
    provider: Arc<P>,
    store: Arc<dyn HandleStore>,
    options: SessionOptions,
    negotiator: PermissionNegotiator,
    root: Option<P::Handle>,
    snapshot: Option<TreeSnapshot<P::Handle>>,
    tree_state: TreeState,
    statuses: StatusMap,
    scans: ScanCoordinator,
    scan_failures: Vec<ScanError>,
}

impl<P: CapabilityProvider> CaseSession<P> {
    /// Create a session and load the status map.
    ///
    /// An unreadable status partition degrades to an empty map.
    pub fn new(provider: Arc<P>, store: Arc<dyn HandleStore>, options: SessionOptions) -> Self {
        let statuses = match store.load_all_status() {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!(error = %e, "Failed to load case status map");
                StatusMap::new()
            }
        };
        debug!(count = statuses.len(), "Loaded case status map");

        Self {
            provider,
            store,
            options,
            negotiator: PermissionNegotiator::new(),
            root: None,
            snapshot: None,
            tree_state: TreeState::new(),
            statuses,
            scans: ScanCoordinator::new(),
            scan_failures: Vec::new(),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn negotiation_state(&self) -> NegotiationState {
        self.negotiator.state()
    }

    pub fn root(&self) -> Option<&P::Handle> {
        self.root.as_ref()
    }

    pub fn snapshot(&self) -> Option<&TreeSnapshot<P::Handle>> {
        self.snapshot.as_ref()
    }

    pub fn tree_state(&self) -> &TreeState {
        &self.tree_state
    }

    /// Subtrees skipped by the last applied scan.
    pub fn last_scan_failures(&self) -> &[ScanError] {
        &self.scan_failures
    }

    fn load_persisted_root(&self) -> Option<P::Handle> {
        let record = match self.store.load_root() {
            Ok(record) => record?,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted root handle");
                return None;
            }
        };
        match record.decode::<P::Handle>() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(root = %record.name, error = %e, "Persisted root handle is unusable");
                None
            }
        }
    }

    /// Reload the persisted root: negotiate permission and scan when granted.
    ///
    /// A missing handle, a refusal or a declined prompt all leave the session
    /// without a tree and are not errors.
    pub async fn restore(&mut self) -> Result<NegotiationState, ApiError> {
        let handle = self.load_persisted_root();
        let state = self
            .negotiator
            .negotiate(self.provider.as_ref(), handle.as_ref())
            .await;

        match (state, handle) {
            (NegotiationState::Granted, Some(handle)) => {
                info!(root = %handle.name(), "Restored case directory");
                self.root = Some(handle);
                self.refresh().await?;
            }
            _ => {
                self.root = None;
                self.snapshot = None;
            }
        }
        Ok(state)
    }

    /// Let the user pick a new case directory, persist it and scan it.
    pub async fn import_folder(&mut self) -> Result<&TreeSnapshot<P::Handle>, ApiError> {
        let handle = self.provider.pick_directory().await?;
        self.negotiator.grant_fresh_import();

        match RootRecord::from_handle(&handle) {
            Ok(record) => {
                if let Err(e) = self.store.save_root(&record) {
                    warn!(root = %handle.name(), error = %e, "Failed to persist root handle");
                }
            }
            Err(e) => warn!(root = %handle.name(), error = %e, "Failed to encode root handle"),
        }
        info!(root = %handle.name(), "Imported case directory");

        self.root = Some(handle);
        self.snapshot = None;
        self.tree_state.reset();
        self.refresh().await?;
        self.snapshot.as_ref().ok_or(ApiError::NoRoot)
    }

    /// Forget the persisted root and the current tree.
    ///
    /// The in-memory state is reset even when the store cannot be cleared;
    /// that failure is logged and returned afterwards.
    pub fn clear_root(&mut self) -> Result<(), ApiError> {
        let cleared = self.store.clear_root();
        self.scans.invalidate();
        self.negotiator.reset();
        self.root = None;
        self.snapshot = None;
        self.scan_failures.clear();
        self.tree_state.reset();
        if let Err(e) = cleared {
            warn!(error = %e, "Failed to clear persisted root handle");
            return Err(e.into());
        }
        info!("Cleared case directory");
        Ok(())
    }

    /// Issue a ticket for a re-scan of the current root. Any scan started
    /// earlier becomes stale.
    pub fn begin_rescan(&self) -> Result<PendingScan<P>, ApiError> {
        let root = self.root.clone().ok_or(ApiError::NoRoot)?;
        if !self.negotiator.state().is_granted() {
            return Err(ApiError::PermissionNotGranted);
        }
        Ok(PendingScan {
            provider: Arc::clone(&self.provider),
            root,
            policy: self.options.scan_policy,
            ticket: self.scans.begin(),
        })
    }

    /// Apply a finished scan. Returns `false` when the scan was superseded
    /// and its result discarded.
    pub fn apply_scan(&mut self, outcome: ScanOutcome<P::Handle>) -> Result<bool, ApiError> {
        if !self.scans.is_current(&outcome.ticket) {
            debug!(
                generation = outcome.ticket.generation(),
                "Discarding superseded scan result"
            );
            return Ok(false);
        }

        let report = outcome.result?;
        if !report.is_complete() {
            warn!(skipped = report.failures.len(), "Scan finished with unreadable subtrees");
        }
        let snapshot = TreeSnapshot::new(report.root);
        self.tree_state.seed(snapshot.root());
        self.scan_failures = report.failures;
        self.snapshot = Some(snapshot);
        Ok(true)
    }

    /// Re-scan the current root and apply the result.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let pending = self.begin_rescan()?;
        let outcome = pending.run().await;
        self.apply_scan(outcome)?;
        Ok(())
    }

    fn require_snapshot(&self) -> Result<TreeSnapshot<P::Handle>, ApiError> {
        self.snapshot.clone().ok_or(ApiError::NoRoot)
    }

    pub fn toggle(&mut self, path: &str) -> bool {
        self.tree_state.toggle(path)
    }

    pub fn expand_all(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            self.tree_state.expand_all(snapshot.root());
        }
    }

    pub fn collapse_all(&mut self) {
        self.tree_state.collapse_all();
    }

    /// A directory was clicked: it becomes the current directory.
    pub fn click_directory(&mut self, path: &str) -> Result<(), ApiError> {
        let snapshot = self.require_snapshot()?;
        let dir = snapshot
            .root()
            .find_directory(path)
            .ok_or_else(|| ApiError::DirectoryNotFound(path.to_string()))?;
        self.tree_state.on_directory_click(dir);
        Ok(())
    }

    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    /// Stored tag of a case file, `None` when it has none.
    pub fn status_of(&self, file_name: &str) -> CaseStatus {
        self.statuses.get(file_name).cloned().unwrap_or_default()
    }

    /// Update a tag in memory and persist it. A failed save is logged only.
    pub fn set_status(&mut self, file_name: &str, status: CaseStatus) {
        if let Err(e) = self.store.save_status(file_name, &status) {
            warn!(file = %file_name, error = %e, "Failed to persist case status");
        }
        self.statuses.insert(file_name.to_string(), status);
    }

    /// Status badge of the directory at `path`.
    pub fn folder_status(&self, path: &str) -> Option<CaseStatus> {
        let snapshot = self.snapshot.as_ref()?;
        let dir = snapshot.root().find_directory(path)?;
        cases::folder_status(dir, &self.statuses)
    }

    /// First file named `name` in the current tree.
    pub fn find_file(&self, name: &str) -> Option<&FileNode<P::Handle>> {
        self.snapshot.as_ref()?.root().find_file_by_name(name)
    }

    /// Summaries of every case file in the current tree.
    pub async fn summaries(&self) -> Result<AggregateReport<P::Handle>, ApiError> {
        let snapshot = self.require_snapshot()?;
        Ok(cases::aggregate(
            self.provider.as_ref(),
            snapshot.root(),
            self.options.max_concurrent_reads,
        )
        .await)
    }

    fn locate_file(&self, file_name: &str) -> Result<(P::Handle, String), ApiError> {
        let snapshot = self.require_snapshot()?;
        let file = snapshot
            .root()
            .find_file_by_name(file_name)
            .ok_or_else(|| ApiError::CaseNotFound(file_name.to_string()))?;
        Ok((file.handle.clone(), file.path.clone()))
    }

    /// Read a case file and record its status in the status map.
    pub async fn open_case(&mut self, file_name: &str) -> Result<CaseDocument, ApiError> {
        let (handle, path) = self.locate_file(file_name)?;
        let document = cases::read_case_document(self.provider.as_ref(), &handle, &path).await?;
        self.set_status(file_name, document.case.status.clone());
        debug!(file = %file_name, records = document.records.len(), "Opened case file");
        Ok(document)
    }

    /// Rewrite the status of a case file on disk, then in the status map.
    pub async fn update_case_status(
        &mut self,
        file_name: &str,
        status: CaseStatus,
    ) -> Result<(), ApiError> {
        let (handle, path) = self.locate_file(file_name)?;
        let bytes = self
            .provider
            .read_file(&handle)
            .await
            .map_err(|source| CaseFileError::Read {
                path: path.clone(),
                source,
            })?;
        let rewritten = cases::rewrite_status(&path, &bytes, &status)?;
        self.provider.write_file(&handle, &rewritten).await?;
        info!(file = %file_name, status = %status, "Updated case status");
        self.set_status(file_name, status);
        Ok(())
    }

    /// Create `<dir name>.json` in the current directory and re-scan.
    /// Returns the path of the new file.
    pub async fn create_case_file(&mut self) -> Result<String, ApiError> {
        let snapshot = self.require_snapshot()?;
        let current = self
            .tree_state
            .current_dir()
            .ok_or(ApiError::NoRoot)?
            .to_string();
        let dir = snapshot
            .root()
            .find_directory(&current)
            .ok_or_else(|| ApiError::DirectoryNotFound(current.clone()))?;

        let file_name = format!("{}.json", dir.name);
        let path = join_path(&dir.path, &file_name);
        if let Some(existing) = cases::case_file_of(dir) {
            return Err(CapabilityError::AlreadyExists(existing.path.clone()).into());
        }

        let contents = CaseDocument::template(&dir.name)
            .to_json_bytes()
            .map_err(|source| CaseFileError::Parse {
                path: path.clone(),
                source,
            })?;
        self.provider
            .create_file(&dir.handle, &file_name, &contents)
            .await?;
        info!(path = %path, "Created case file");

        self.refresh().await?;
        Ok(path)
    }
}
