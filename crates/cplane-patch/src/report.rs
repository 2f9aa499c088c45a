//! Classifier inputs and verdicts

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Default churn threshold, in percent of the original file
pub const DEFAULT_MAX_CHANGE_PERCENT: f64 = 30.0;

/// Filename reported when a diff section has no usable path
pub const UNKNOWN_FILE: &str = "unknown";

/// Thresholds a patch is checked against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchPolicy {
    /// A file whose change percentage exceeds this is rejected
    pub max_change_percent: f64,
    /// Also reject edits that only touch comments and formatting
    pub strict: bool,
}

impl PatchPolicy {
    /// Policy with the given threshold and strictness
    #[must_use]
    pub const fn new(max_change_percent: f64, strict: bool) -> Self {
        Self {
            max_change_percent,
            strict,
        }
    }

    /// Override fields that are present
    #[must_use]
    pub fn with_overrides(self, max_change_percent: Option<f64>, strict: Option<bool>) -> Self {
        Self {
            max_change_percent: max_change_percent.unwrap_or(self.max_change_percent),
            strict: strict.unwrap_or(self.strict),
        }
    }
}

impl Default for PatchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHANGE_PERCENT, true)
    }
}

/// Kinds of mutation-contract violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Input is not a unified diff
    InvalidFormat,
    /// Churn above the policy threshold
    ExcessiveChange,
    /// No context lines at all: the file was replaced, not edited
    FullRewrite,
    /// Only indentation or spacing changed
    WhitespaceOnly,
    /// Import lines shuffled with no other difference
    ImportReorder,
    /// Only comments and formatting changed
    FormattingOnly,
}

impl ViolationKind {
    /// Wire name, e.g. `excessive-change`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid-format",
            Self::ExcessiveChange => "excessive-change",
            Self::FullRewrite => "full-rewrite",
            Self::WhitespaceOnly => "whitespace-only",
            Self::ImportReorder => "import-reorder",
            Self::FormattingOnly => "formatting-only",
        }
    }
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contract violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    /// Absent only for `invalid-format`, which concerns the whole input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
    /// Set for `excessive-change` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_changed: Option<f64>,
}

impl Violation {
    pub(crate) fn for_file(kind: ViolationKind, file: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: Some(file.to_string()),
            message: message.into(),
            percent_changed: None,
        }
    }
}

/// Per-file classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub added: usize,
    pub removed: usize,
    pub context: usize,
    pub percent_changed: f64,
    pub violations: Vec<Violation>,
}

/// Verdict for a whole patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Mean of the per-file percentages
    pub percent_changed: f64,
    pub files: Vec<FileReport>,
    /// All file violations, in file order
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// Whether any violation of `kind` was found
    #[must_use]
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}
