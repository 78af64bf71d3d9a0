//! Handle Store
//!
//! Durable key-value storage for the single persisted root directory handle
//! and the per-file status tags. The two live in independent partitions.

pub mod persistence;

use crate::capability::CapabilityHandle;
use crate::error::StorageError;
use crate::types::{CaseStatus, StatusMap};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub use persistence::SledHandleStore;

/// Partition holding capability handles.
pub const HANDLES_PARTITION: &str = "handles";

/// Partition holding status tags.
pub const STATUS_PARTITION: &str = "case-status";

/// Fixed key of the persisted root handle.
pub const ROOT_KEY: &str = "rootDir";

/// Persisted root handle.
///
/// The handle itself is opaque to the store and kept as encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    pub name: String,
    pub handle: Vec<u8>,
    pub saved_at_ms: i64,
}

impl RootRecord {
    pub fn from_handle<H: CapabilityHandle>(handle: &H) -> Result<Self, StorageError> {
        Ok(Self {
            name: handle.name().to_string(),
            handle: bincode::serialize(handle)?,
            saved_at_ms: Utc::now().timestamp_millis(),
        })
    }

    pub fn decode<H: CapabilityHandle>(&self) -> Result<H, StorageError> {
        Ok(bincode::deserialize(&self.handle)?)
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.saved_at_ms).single()
    }
}

/// Handle store interface
///
/// `save_root` overwrites: there is only ever one root.
pub trait HandleStore: Send + Sync {
    fn save_root(&self, record: &RootRecord) -> Result<(), StorageError>;
    fn load_root(&self) -> Result<Option<RootRecord>, StorageError>;
    fn clear_root(&self) -> Result<(), StorageError>;
    fn save_status(&self, key: &str, status: &CaseStatus) -> Result<(), StorageError>;
    fn load_all_status(&self) -> Result<StatusMap, StorageError>;
}
