//! Case file document model.
//!
//! Only `case.id` is required. Every other field falls back to a default so
//! that hand-edited files with missing metadata still load.

use crate::error::CaseFileError;
use crate::types::CaseStatus;
use chrono::{SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Format version written into new case files.
pub const CASE_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    CASE_FORMAT_VERSION
}

/// `null` and missing both mean "no status".
fn status_or_null<'de, D>(deserializer: D) -> Result<CaseStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(CaseStatus::from)
        .unwrap_or_default())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The `case` object of a case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub crime: Option<String>,
    #[serde(default)]
    pub victim: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "resume")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "status_or_null")]
    pub status: CaseStatus,
}

/// A whole case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub case: CaseMetadata,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
    /// Records are carried along untouched.
    #[serde(default)]
    pub records: Vec<Value>,
}

impl CaseDocument {
    /// Fresh document for a new case folder.
    pub fn template(id: &str) -> Self {
        Self {
            version: CASE_FORMAT_VERSION,
            case: CaseMetadata {
                id: id.to_string(),
                title: Some(String::new()),
                crime: Some(String::new()),
                victim: Some(String::new()),
                date: Some(String::new()),
                notes: Some(String::new()),
                status: CaseStatus::None,
            },
            updated_at: Some(now_rfc3339()),
            records: Vec::new(),
        }
    }

    /// Decode the raw bytes of the file at `path`.
    pub fn parse(path: &str, bytes: &[u8]) -> Result<Self, CaseFileError> {
        let text = decode_utf8(path, bytes)?;
        serde_json::from_str(text).map_err(|source| CaseFileError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

fn decode_utf8<'a>(path: &str, bytes: &'a [u8]) -> Result<&'a str, CaseFileError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CaseFileError::Encoding {
        path: path.to_string(),
    })?;
    Ok(text.trim_start_matches('\u{feff}'))
}

/// Rewrite `case.status` in a raw case file and refresh `updatedAt`.
///
/// Works on the raw JSON value so that fields this crate does not model
/// survive the rewrite.
pub fn rewrite_status(
    path: &str,
    bytes: &[u8],
    status: &CaseStatus,
) -> Result<Vec<u8>, CaseFileError> {
    let parse_error = |source| CaseFileError::Parse {
        path: path.to_string(),
        source,
    };

    let text = decode_utf8(path, bytes)?;
    let mut value: Value = serde_json::from_str(text).map_err(parse_error)?;

    let root = value
        .as_object_mut()
        .ok_or_else(|| parse_error(serde_json::Error::custom("case file is not a JSON object")))?;
    let case = root
        .get_mut("case")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| parse_error(serde_json::Error::custom("missing `case` object")))?;
    case.insert("status".to_string(), Value::String(status.to_string()));
    root.insert("updatedAt".to_string(), Value::String(now_rfc3339()));

    serde_json::to_vec_pretty(&value).map_err(parse_error)
}
