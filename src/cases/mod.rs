//! Case files: one JSON document per folder, named after the folder.

pub mod aggregate;
pub mod document;
pub mod summary;

pub use aggregate::{
    aggregate, case_file_of, collect_case_files, folder_status, read_case_document,
    AggregateReport, CaseFileRef,
};
pub use document::{rewrite_status, CaseDocument, CaseMetadata, CASE_FORMAT_VERSION};
pub use summary::CaseSummary;
