//! Error types for action dispatch and the edit guard
//!
//! Every [`ActionError`] maps onto the failure envelope
//! `{ok: false, error, details?}` printed by the adapters.

use cplane_patch::Violation;
use cplane_store::StoreError;
use serde_json::{json, Value};

/// Errors while turning a JSON request into a core call
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Nothing but whitespace on input
    #[error("Empty input")]
    EmptyInput,

    /// Input is not a JSON object
    #[error("Invalid JSON input")]
    InvalidJson(#[source] serde_json::Error),

    /// Request has no `action`
    #[error("Missing action")]
    MissingAction,

    /// `action` names nothing we handle
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Validate request without a `patch` string
    #[error("Missing patch")]
    MissingPatch,

    /// Artifact over the size limit; nothing was written
    #[error("Artifact exceeds max_bytes")]
    ArtifactTooLarge { bytes: u64, max_bytes: u64 },

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ActionError {
    /// Wire `error` text
    ///
    /// Store failures other than caller contract errors are reported as
    /// `Unhandled error`, with the original message kept in [`details`](Self::details).
    #[must_use]
    pub fn wire_message(&self) -> String {
        match self {
            Self::Store(e) if !e.is_contract_error() => "Unhandled error".to_string(),
            other => other.to_string(),
        }
    }

    /// Wire `details`, when there are any
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::ArtifactTooLarge { bytes, max_bytes } => {
                Some(json!({ "bytes": bytes, "maxBytes": max_bytes }))
            }
            Self::Store(e) if !e.is_contract_error() => Some(json!({ "message": e.to_string() })),
            _ => None,
        }
    }

    /// The `{ok: false, error, details?}` envelope
    #[must_use]
    pub fn envelope(&self) -> Value {
        let mut out = json!({ "ok": false, "error": self.wire_message() });
        if let Some(details) = self.details() {
            out["details"] = details;
        }
        out
    }
}

/// Result type alias for action dispatch
pub type ActionResult<T> = Result<T, ActionError>;

/// Edit rejected by the guard
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuardError {
    /// The patch broke the mutation contract
    #[error("Mutation contract violated: {}", render_violations(.violations))]
    ContractViolated { violations: Vec<Violation> },
}

fn render_violations(violations: &[Violation]) -> String {
    serde_json::to_string(violations).unwrap_or_else(|_| format!("{violations:?}"))
}
