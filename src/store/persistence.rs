//! Sled-backed handle store.
//!
//! Each partition is a sled tree. A `meta` tree carries the schema version;
//! opening the store creates missing partitions and bumps the version without
//! touching existing data.

use super::{HandleStore, RootRecord, HANDLES_PARTITION, ROOT_KEY, STATUS_PARTITION};
use crate::error::StorageError;
use crate::types::{CaseStatus, StatusMap};
use std::path::Path;
use tracing::{info, warn};

/// Current schema version. Version 1 only had the handles partition.
pub const SCHEMA_VERSION: u32 = 2;

const META_TREE: &str = "meta";
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Handle store persisted in a sled database.
pub struct SledHandleStore {
    db: sled::Db,
    handles: sled::Tree,
    statuses: sled::Tree,
}

impl SledHandleStore {
    /// Open (or create) the store at `path`, upgrading the schema if needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Store that lives only as long as the value.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let found = Self::read_version(&db)?;
        if found > SCHEMA_VERSION {
            return Err(StorageError::SchemaVersion {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        let handles = db.open_tree(HANDLES_PARTITION)?;
        let statuses = db.open_tree(STATUS_PARTITION)?;

        if found < SCHEMA_VERSION {
            db.open_tree(META_TREE)?
                .insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_be_bytes().to_vec())?;
            db.flush()?;
            info!(from = found, to = SCHEMA_VERSION, "Upgraded handle store schema");
        }

        Ok(Self {
            db,
            handles,
            statuses,
        })
    }

    fn read_version(db: &sled::Db) -> Result<u32, StorageError> {
        let meta = db.open_tree(META_TREE)?;
        match meta.get(SCHEMA_VERSION_KEY)? {
            None => Ok(0),
            Some(bytes) => {
                let raw: [u8; 4] = bytes[..].try_into().map_err(|_| {
                    StorageError::InvalidRecord(format!(
                        "schema version has {} bytes, expected 4",
                        bytes.len()
                    ))
                })?;
                Ok(u32::from_be_bytes(raw))
            }
        }
    }

    pub fn schema_version(&self) -> Result<u32, StorageError> {
        Self::read_version(&self.db)
    }
}

impl HandleStore for SledHandleStore {
    fn save_root(&self, record: &RootRecord) -> Result<(), StorageError> {
        let bytes = bincode::serialize(record)?;
        self.handles.insert(ROOT_KEY, bytes)?;
        self.handles.flush()?;
        Ok(())
    }

    fn load_root(&self) -> Result<Option<RootRecord>, StorageError> {
        match self.handles.get(ROOT_KEY)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn clear_root(&self) -> Result<(), StorageError> {
        self.handles.remove(ROOT_KEY)?;
        self.handles.flush()?;
        Ok(())
    }

    fn save_status(&self, key: &str, status: &CaseStatus) -> Result<(), StorageError> {
        let bytes = bincode::serialize(status)?;
        self.statuses.insert(key.as_bytes(), bytes)?;
        self.statuses.flush()?;
        Ok(())
    }

    fn load_all_status(&self) -> Result<StatusMap, StorageError> {
        let mut map = StatusMap::new();
        for item in self.statuses.iter() {
            let (key, value) = item?;
            let key = match std::str::from_utf8(&key) {
                Ok(key) => key.to_string(),
                Err(e) => {
                    warn!(error = %e, "Skipping status entry with non UTF-8 key");
                    continue;
                }
            };
            match bincode::deserialize::<CaseStatus>(&value) {
                Ok(status) => {
                    map.insert(key, status);
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable status entry"),
            }
        }
        Ok(map)
    }
}
