use super::document::CaseDocument;
use crate::types::CaseStatus;
use serde::Serialize;

/// Flattened, read-only view of one case file.
///
/// Recomputed on every aggregation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary<H> {
    pub id: String,
    pub title: Option<String>,
    pub crime: Option<String>,
    pub victim: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub status: CaseStatus,
    pub folder_path: String,
    pub folder_name: String,
    pub file_name: String,
    #[serde(skip)]
    pub handle: H,
}

impl<H> CaseSummary<H> {
    pub fn project(
        document: CaseDocument,
        folder_path: &str,
        folder_name: &str,
        file_name: &str,
        handle: H,
    ) -> Self {
        let case = document.case;
        Self {
            id: case.id,
            title: case.title,
            crime: case.crime,
            victim: case.victim,
            date: case.date,
            notes: case.notes,
            status: case.status,
            folder_path: folder_path.to_string(),
            folder_name: folder_name.to_string(),
            file_name: file_name.to_string(),
            handle,
        }
    }
}
