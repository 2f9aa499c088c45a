//! cplane patch classifier
//!
//! Decides whether a unified diff is an acceptable, reviewable change.
//!
//! # Checks
//!
//! - `excessive-change`: churn above the policy threshold, measured against
//!   the original file size
//! - `full-rewrite`: additions and removals with no surrounding context
//! - `whitespace-only`: lines re-indented or re-spaced, nothing else
//! - `import-reorder`: import lines shuffled, nothing else
//! - `formatting-only` (strict): only comments and formatting changed
//!
//! Every check is line-textual, so any language's diff classifies the same
//! way. Nothing here computes diffs or performs I/O.
//!
//! # Example
//!
//! ```rust
//! use cplane_patch::{validate_patch, PatchPolicy, ViolationKind};
//!
//! let patch = "\
//! --- a/src/lib.rs
//! +++ b/src/lib.rs
//! @@ -1,2 +1,2 @@
//!  fn main() {
//! -        run();
//! +    run();
//! ";
//! let result = validate_patch(patch, &PatchPolicy::default());
//! assert!(!result.valid);
//! assert!(result.has(ViolationKind::WhitespaceOnly));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod heuristics;
mod parse;
mod report;
mod validator;

pub use report::{
    FileReport, PatchPolicy, ValidationResult, Violation, ViolationKind,
    DEFAULT_MAX_CHANGE_PERCENT, UNKNOWN_FILE,
};
pub use validator::{change_percent, validate_patch};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
