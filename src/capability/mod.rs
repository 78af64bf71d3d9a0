//! Capability Provider
//!
//! The host environment hands out opaque handles to filesystem entries, each
//! obtained through explicit user consent. Everything in the crate talks to the
//! filesystem through this trait, never through a concrete API, so the scanner
//! and the store depend only on the capability.

pub mod local;
pub mod memory;

use crate::error::CapabilityError;
use crate::types::{EntryKind, PermissionState};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

pub use local::{LocalCapabilityProvider, LocalHandle};
pub use memory::{MemoryCapabilityProvider, MemoryHandle};

/// Opaque reference to one filesystem entry.
///
/// Handles must survive being persisted by the handle store, hence the serde
/// bounds. Equality means "refers to the same entry".
pub trait CapabilityHandle:
    Clone + fmt::Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Last path segment of the entry.
    fn name(&self) -> &str;

    fn kind(&self) -> EntryKind;
}

/// One entry yielded by a directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry<H> {
    pub name: String,
    pub kind: EntryKind,
    pub handle: H,
}

/// Host capability interface.
///
/// Every method is a suspension point; none of them is retried by the crate.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    type Handle: CapabilityHandle;

    /// Ask the user to pick a directory. The returned handle is granted.
    async fn pick_directory(&self) -> Result<Self::Handle, CapabilityError>;

    /// List the direct children of a directory, in host order.
    async fn list_entries(
        &self,
        dir: &Self::Handle,
    ) -> Result<Vec<DirEntry<Self::Handle>>, CapabilityError>;

    /// Current read permission, without prompting.
    async fn query_permission(
        &self,
        handle: &Self::Handle,
    ) -> Result<PermissionState, CapabilityError>;

    /// Prompt the user for read permission. May never resolve if the user
    /// never answers.
    async fn request_permission(
        &self,
        handle: &Self::Handle,
    ) -> Result<PermissionState, CapabilityError>;

    async fn read_file(&self, file: &Self::Handle) -> Result<Vec<u8>, CapabilityError>;

    /// Replace the contents of an existing file.
    async fn write_file(&self, file: &Self::Handle, contents: &[u8])
        -> Result<(), CapabilityError>;

    /// Create a new file inside `dir`. Fails with `AlreadyExists` if the name
    /// is taken.
    async fn create_file(
        &self,
        dir: &Self::Handle,
        name: &str,
        contents: &[u8],
    ) -> Result<Self::Handle, CapabilityError>;
}
