//! Scan supersession
//!
//! A re-scan started while an earlier scan of the same root is still running
//! supersedes it: only the result of the most recently started scan may be
//! applied, and an older result that completes late is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Ticket identifying one scan invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanTicket {
    generation: u64,
}

impl ScanTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issues scan tickets and decides which result wins.
///
/// Clones share the same generation counter.
#[derive(Debug, Clone, Default)]
pub struct ScanCoordinator {
    latest: Arc<AtomicU64>,
}

impl ScanCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scan. Every ticket issued before this one becomes stale.
    pub fn begin(&self) -> ScanTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Scan started");
        ScanTicket { generation }
    }

    /// Whether no newer scan has been started since `ticket` was issued.
    pub fn is_current(&self, ticket: &ScanTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Make every outstanding ticket stale without starting a scan.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
