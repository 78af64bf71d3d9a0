//! Casebook: persisted case folders, lazy trees and case status tags
//!
//! A user grants access to a case directory once; later sessions re-open it
//! through a persisted capability handle, re-negotiating read permission on
//! reload. The directory is scanned into an immutable tree snapshot, browsed
//! through an expand/collapse state, and every folder's case file can carry a
//! status tag that survives reloads.

pub mod capability;
pub mod cases;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod permission;
pub mod session;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use capability::{CapabilityHandle, CapabilityProvider};
pub use error::ApiError;
pub use session::{CaseSession, SessionOptions};
