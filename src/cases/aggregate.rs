//! Case Summary Aggregator
//!
//! Walks a tree snapshot, finds the case file of every folder and reads them
//! with bounded concurrency. One bad file never aborts the batch.

use super::document::CaseDocument;
use super::summary::CaseSummary;
use crate::capability::CapabilityProvider;
use crate::error::CaseFileError;
use crate::tree::{DirectoryNode, FileNode};
use crate::types::{CaseStatus, StatusMap};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

fn fold_name(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}

/// The case file of `dir`: a direct file child named `<dir name>.json`,
/// compared case-insensitively.
pub fn case_file_of<H>(dir: &DirectoryNode<H>) -> Option<&FileNode<H>> {
    let wanted = fold_name(&format!("{}.json", dir.name));
    dir.files().find(|file| fold_name(&file.name) == wanted)
}

/// A located case file together with the folder it belongs to.
#[derive(Debug)]
pub struct CaseFileRef<'a, H> {
    pub folder: &'a DirectoryNode<H>,
    pub file: &'a FileNode<H>,
}

/// Every case file below `root`, folders visited depth-first pre-order.
pub fn collect_case_files<H>(root: &DirectoryNode<H>) -> Vec<CaseFileRef<'_, H>> {
    root.directories()
        .filter_map(|folder| case_file_of(folder).map(|file| CaseFileRef { folder, file }))
        .collect()
}

/// Status badge of a folder: the tag of its case file, if it has one.
pub fn folder_status<H>(dir: &DirectoryNode<H>, statuses: &StatusMap) -> Option<CaseStatus> {
    let file = case_file_of(dir)?;
    Some(statuses.get(&file.name).cloned().unwrap_or_default())
}

/// Read and parse the case file at `path`.
pub async fn read_case_document<P: CapabilityProvider>(
    provider: &P,
    file: &P::Handle,
    path: &str,
) -> Result<CaseDocument, CaseFileError> {
    let bytes = provider
        .read_file(file)
        .await
        .map_err(|source| CaseFileError::Read {
            path: path.to_string(),
            source,
        })?;
    CaseDocument::parse(path, &bytes)
}

/// Result of one aggregation pass.
#[derive(Debug)]
pub struct AggregateReport<H> {
    pub summaries: Vec<CaseSummary<H>>,
    /// Files that could not be read or parsed.
    pub failures: Vec<CaseFileError>,
}

impl<H> AggregateReport<H> {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Aggregate every case file below `root`.
///
/// Up to `max_concurrent` reads are in flight at once. Output order follows
/// the folder order of the tree regardless of completion order, so two passes
/// over the same snapshot give the same list.
pub async fn aggregate<P: CapabilityProvider>(
    provider: &P,
    root: &DirectoryNode<P::Handle>,
    max_concurrent: usize,
) -> AggregateReport<P::Handle> {
    let case_files = collect_case_files(root);
    debug!(count = case_files.len(), "Reading case files");

    let results: Vec<_> = stream::iter(case_files)
        .map(move |found| async move {
            read_case_document(provider, &found.file.handle, &found.file.path)
                .await
                .map(|document| {
                    CaseSummary::project(
                        document,
                        &found.folder.path,
                        &found.folder.name,
                        &found.file.name,
                        found.file.handle.clone(),
                    )
                })
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let mut report = AggregateReport {
        summaries: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for result in results {
        match result {
            Ok(summary) => report.summaries.push(summary),
            Err(e) => {
                warn!(path = %e.path(), error = %e, "Skipping unreadable case file");
                report.failures.push(e);
            }
        }
    }
    report
}
