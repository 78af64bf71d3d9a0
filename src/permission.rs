//! Permission Negotiator
//!
//! Before a persisted root handle can be scanned after a reload, read
//! permission has to be re-established:
//!
//! ```text
//! Unloaded -> Loaded -> { Granted, Denied, NeedsPrompt } -> { Granted, Denied }
//! ```
//!
//! A handle the user already refused is never prompted for again. A declined
//! prompt is a silent no-op, not an error.

use crate::capability::{CapabilityHandle, CapabilityProvider};
use crate::types::PermissionState;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Negotiation state for the persisted root handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NegotiationState {
    /// No handle persisted.
    Unloaded,
    /// Handle loaded, permission not yet known.
    Loaded,
    Granted,
    Denied,
    /// Waiting for the user to answer a permission prompt.
    NeedsPrompt,
}

impl NegotiationState {
    /// Whether the handle may be scanned.
    pub fn is_granted(&self) -> bool {
        matches!(self, NegotiationState::Granted)
    }
}

/// Drives the negotiation state machine for one handle at a time.
#[derive(Debug, Clone)]
pub struct PermissionNegotiator {
    state: NegotiationState,
}

impl Default for PermissionNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionNegotiator {
    pub fn new() -> Self {
        Self {
            state: NegotiationState::Unloaded,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Negotiate read permission for a restored handle.
    ///
    /// `None` means nothing was persisted; the state stays `Unloaded`.
    /// A failed permission query is treated like any non-final answer and
    /// leads to a prompt; a failed prompt ends in `Denied`.
    pub async fn negotiate<P: CapabilityProvider>(
        &mut self,
        provider: &P,
        handle: Option<&P::Handle>,
    ) -> NegotiationState {
        let Some(handle) = handle else {
            self.state = NegotiationState::Unloaded;
            return self.state;
        };
        self.state = NegotiationState::Loaded;

        let current = match provider.query_permission(handle).await {
            Ok(state) => state,
            Err(e) => {
                warn!(root = %handle.name(), error = %e, "Permission query failed");
                PermissionState::Prompt
            }
        };

        self.state = match current {
            PermissionState::Granted => NegotiationState::Granted,
            PermissionState::Denied => {
                info!(root = %handle.name(), "Read permission denied, not prompting");
                NegotiationState::Denied
            }
            PermissionState::Prompt => {
                self.state = NegotiationState::NeedsPrompt;
                debug!(root = %handle.name(), "Requesting read permission");
                match provider.request_permission(handle).await {
                    Ok(PermissionState::Granted) => NegotiationState::Granted,
                    Ok(_) => {
                        info!(root = %handle.name(), "Read permission declined");
                        NegotiationState::Denied
                    }
                    Err(e) => {
                        warn!(root = %handle.name(), error = %e, "Permission request failed");
                        NegotiationState::Denied
                    }
                }
            }
        };
        self.state
    }

    /// A freshly picked directory is granted by construction.
    pub fn grant_fresh_import(&mut self) {
        self.state = NegotiationState::Granted;
    }

    /// The persisted handle was cleared.
    pub fn reset(&mut self) {
        self.state = NegotiationState::Unloaded;
    }
}
