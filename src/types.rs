//! Core types shared across the scanner, store, and session.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Status tag attached to a case file.
///
/// Serialized as a plain lowercase label. Labels written by other tools are
/// kept verbatim in `Other` so a round trip never loses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaseStatus {
    #[default]
    None,
    Waiting,
    Completed,
    Urgent,
    Other(String),
}

impl CaseStatus {
    /// Known labels accepted from users.
    pub const LABELS: [&'static str; 4] = ["none", "waiting", "completed", "urgent"];

    /// Parse one of the known labels; `"null"` and the empty string mean `None`.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "null" => Some(CaseStatus::None),
            "waiting" => Some(CaseStatus::Waiting),
            "completed" => Some(CaseStatus::Completed),
            "urgent" => Some(CaseStatus::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CaseStatus::None => "none",
            CaseStatus::Waiting => "waiting",
            CaseStatus::Completed => "completed",
            CaseStatus::Urgent => "urgent",
            CaseStatus::Other(label) => label,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CaseStatus::None)
    }
}

impl From<String> for CaseStatus {
    fn from(label: String) -> Self {
        CaseStatus::parse_label(&label).unwrap_or(CaseStatus::Other(label))
    }
}

impl From<CaseStatus> for String {
    fn from(status: CaseStatus) -> Self {
        match status {
            CaseStatus::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for CaseStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::parse_label(s).ok_or_else(|| {
            ApiError::InvalidStatus(format!(
                "{} (expected one of: {})",
                s,
                CaseStatus::LABELS.join(", ")
            ))
        })
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status tags keyed by case file name (not full path).
pub type StatusMap = BTreeMap<String, CaseStatus>;

/// Kind of a filesystem entry behind a capability handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Directory,
    File,
}

/// Permission reported by the host for a capability handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The host has to ask the user before granting access.
    Prompt,
}
