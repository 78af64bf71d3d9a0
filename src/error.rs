//! Error types
//!
//! One enum per failure domain. Capability and scan errors come from the host
//! filesystem, storage errors from the handle store, case-file errors from
//! aggregation. `ApiError` is what the session and the CLI return.

use thiserror::Error;

/// Errors reported by a capability provider.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Duplicate entry name in directory listing: {0}")]
    DuplicateEntry(String),

    #[error("Directory selection cancelled")]
    Cancelled,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

/// A directory (or the root) that could not be listed during a scan.
#[derive(Debug, Error)]
#[error("Failed to scan {path}: {source}")]
pub struct ScanError {
    pub path: String,
    #[source]
    pub source: CapabilityError,
}

/// Errors from the durable handle/status store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Store schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: u32, supported: u32 },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// A case file that could not be read or parsed.
#[derive(Debug, Error)]
pub enum CaseFileError {
    #[error("Failed to read case file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: CapabilityError,
    },

    #[error("Case file {path} is not valid UTF-8")]
    Encoding { path: String },

    #[error("Failed to parse case file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CaseFileError {
    /// Path of the offending file.
    pub fn path(&self) -> &str {
        match self {
            CaseFileError::Read { path, .. }
            | CaseFileError::Encoding { path }
            | CaseFileError::Parse { path, .. } => path,
        }
    }
}

/// Session and CLI level errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    CaseFile(#[from] CaseFileError),

    #[error("No case directory has been imported")]
    NoRoot,

    #[error("Read permission for the case directory was not granted")]
    PermissionNotGranted,

    #[error("Case file not found: {0}")]
    CaseNotFound(String),

    #[error("Directory not found in tree: {0}")]
    DirectoryNotFound(String),

    #[error("Invalid case status: {0}")]
    InvalidStatus(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
