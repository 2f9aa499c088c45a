//! Patch validation against the mutation contract

use crate::heuristics;
use crate::parse::{self, SectionLines};
use crate::report::{
    FileReport, PatchPolicy, ValidationResult, Violation, ViolationKind, UNKNOWN_FILE,
};

const NOT_UNIFIED: &str = "Not unified diff";
const VIOLATIONS_FOUND: &str = "Mutation contract violations detected";

/// Classify `patch` against `policy`
///
/// Total: malformed input is reported as an `invalid-format` violation, never
/// as an error. Pure and re-entrant.
#[must_use]
pub fn validate_patch(patch: &str, policy: &PatchPolicy) -> ValidationResult {
    if !parse::is_unified_diff(patch) {
        return ValidationResult {
            valid: false,
            reason: Some(NOT_UNIFIED.to_string()),
            percent_changed: 0.0,
            files: Vec::new(),
            violations: vec![Violation {
                kind: ViolationKind::InvalidFormat,
                file: None,
                message: NOT_UNIFIED.to_string(),
                percent_changed: None,
            }],
        };
    }

    let files: Vec<FileReport> = parse::split_file_sections(patch)
        .into_iter()
        .map(|section| classify_file(section, policy))
        .collect();

    let violations: Vec<Violation> = files
        .iter()
        .flat_map(|f| f.violations.iter().cloned())
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let percent_changed = if files.is_empty() {
        0.0
    } else {
        files.iter().map(|f| f.percent_changed).sum::<f64>() / files.len() as f64
    };

    let valid = violations.is_empty();
    tracing::debug!(
        files = files.len(),
        violations = violations.len(),
        percent_changed,
        "patch classified"
    );

    ValidationResult {
        valid,
        reason: (!valid).then(|| VIOLATIONS_FOUND.to_string()),
        percent_changed,
        files,
        violations,
    }
}

/// Churn relative to the original file: `100 * (added + removed) / original`
///
/// A section with no original lines (a new file) counts as 100%.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn change_percent(added: usize, removed: usize, context: usize) -> f64 {
    let original = removed + context;
    if original == 0 {
        return 100.0;
    }
    100.0 * (added + removed) as f64 / original as f64
}

fn classify_file(section: &str, policy: &PatchPolicy) -> FileReport {
    let file = parse::file_name(section).unwrap_or_else(|| UNKNOWN_FILE.to_string());
    let SectionLines {
        added,
        removed,
        context,
    } = parse::classify(section);

    let percent = change_percent(added.len(), removed.len(), context);
    let mut violations = Vec::new();

    if percent > policy.max_change_percent {
        violations.push(Violation {
            percent_changed: Some(percent),
            ..Violation::for_file(
                ViolationKind::ExcessiveChange,
                &file,
                format!(
                    "Change exceeds threshold ({percent:.1}% > {}%)",
                    policy.max_change_percent
                ),
            )
        });
    }

    if context == 0 && !added.is_empty() && !removed.is_empty() {
        violations.push(Violation::for_file(
            ViolationKind::FullRewrite,
            &file,
            "No context lines detected; likely full rewrite",
        ));
    }

    if heuristics::is_whitespace_only(&added, &removed) {
        violations.push(Violation::for_file(
            ViolationKind::WhitespaceOnly,
            &file,
            "Diff appears to be whitespace-only",
        ));
    }

    if heuristics::is_import_reorder(&added, &removed) {
        violations.push(Violation::for_file(
            ViolationKind::ImportReorder,
            &file,
            "Import lines appear reordered without semantic change",
        ));
    }

    if policy.strict && heuristics::is_formatting_only(&added, &removed) {
        violations.push(Violation::for_file(
            ViolationKind::FormattingOnly,
            &file,
            "Diff appears formatting-only after normalization",
        ));
    }

    FileReport {
        file,
        added: added.len(),
        removed: removed.len(),
        context,
        percent_changed: percent,
        violations,
    }
}
