//! Edit guard: runs the classifier before an edit tool executes

use crate::error::GuardError;
use cplane_patch::{validate_patch, PatchPolicy, ValidationResult};
use serde::Deserialize;
use serde_json::{json, Value};

/// The only tool whose patches are checked
pub const GUARDED_TOOL: &str = "edit";

/// A pending tool call: `{tool, args}`
///
/// Both fields are kept as raw JSON. Tool calls other than [`GUARDED_TOOL`]
/// carry arguments of any shape and must still pass through.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HookPayload {
    pub tool: Value,
    pub args: Value,
}

impl HookPayload {
    /// An `edit` call carrying `patch`
    #[must_use]
    pub fn edit(patch: impl Into<String>) -> Self {
        Self {
            tool: Value::from(GUARDED_TOOL),
            args: json!({ "patch": patch.into() }),
        }
    }

    /// Tool name, when it is a string
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        self.tool.as_str()
    }

    /// The patch argument; anything but a non-empty string is absent
    #[must_use]
    pub fn patch(&self) -> Option<&str> {
        self.args
            .get("patch")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
    }

    /// `max_change_percent` as a number or a numeric string
    #[must_use]
    pub fn max_change_percent(&self) -> Option<f64> {
        let n = match self.args.get("max_change_percent")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        n.filter(|n: &f64| n.is_finite())
    }

    /// `strict` by JSON truthiness; `null` or absent means unset
    #[must_use]
    pub fn strict(&self) -> Option<bool> {
        match self.args.get("strict")? {
            Value::Null => None,
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_f64().is_some_and(|n| n.abs() > 0.0)),
            Value::String(s) => Some(!s.is_empty()),
            Value::Array(_) | Value::Object(_) => Some(true),
        }
    }
}

/// Blocks edits whose patch breaks the mutation contract
#[derive(Debug, Clone, Copy, Default)]
pub struct EditGuard {
    policy: PatchPolicy,
}

impl EditGuard {
    #[must_use]
    pub const fn new(policy: PatchPolicy) -> Self {
        Self { policy }
    }

    /// Check a pending tool call
    ///
    /// Returns `Ok(None)` when the call is not checked at all: another tool,
    /// or an edit without a patch.
    ///
    /// # Errors
    /// [`GuardError::ContractViolated`] with the violations found.
    pub fn check(&self, payload: &HookPayload) -> Result<Option<ValidationResult>, GuardError> {
        if payload.tool() != Some(GUARDED_TOOL) {
            return Ok(None);
        }
        let Some(patch) = payload.patch() else {
            return Ok(None);
        };

        let policy = self
            .policy
            .with_overrides(payload.max_change_percent(), payload.strict());
        let result = validate_patch(patch, &policy);

        if result.valid {
            Ok(Some(result))
        } else {
            tracing::warn!(violations = result.violations.len(), "edit blocked");
            Err(GuardError::ContractViolated {
                violations: result.violations,
            })
        }
    }
}
