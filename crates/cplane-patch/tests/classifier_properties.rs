//! Classifier behavior on realistic diffs.
//!
//! Diffs are built with `cplane_test_utils::FilePatch` so each scenario
//! states exactly how many context, added and removed lines it contains.

use cplane_patch::{validate_patch, PatchPolicy, ViolationKind, UNKNOWN_FILE};
use cplane_test_utils::{multi_file_diff, plain_unified_diff, FilePatch};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn kinds(result: &cplane_patch::ValidationResult) -> Vec<ViolationKind> {
    result.violations.iter().map(|v| v.kind).collect()
}

fn with_context(mut patch: FilePatch, n: usize) -> FilePatch {
    for i in 0..n {
        patch = patch.context(&format!("let unchanged_{i} = {i};"));
    }
    patch
}

#[test]
fn text_without_hunk_marker_is_invalid_format() {
    let result = validate_patch("--- a/x\n+++ b/x\n-old\n+new\n", &PatchPolicy::default());
    assert!(!result.valid);
    assert_eq!(kinds(&result), vec![ViolationKind::InvalidFormat]);
    assert_eq!(result.percent_changed, 0.0);
    assert!(result.files.is_empty());
    assert_eq!(result.reason.as_deref(), Some("Not unified diff"));
    assert_eq!(result.violations[0].file, None);
}

#[test]
fn hunkless_rename_section_counts_as_full_change() {
    let edit = with_context(FilePatch::new("src/kept.rs"), 39)
        .replaced("x = 1", "x = 2")
        .render();
    let rename = "diff --git a/src/old.rs b/src/new.rs\n\
                  similarity index 100%\n\
                  rename from src/old.rs\n\
                  rename to src/new.rs\n";

    let result = validate_patch(&format!("{edit}{rename}"), &PatchPolicy::default());
    assert_eq!(result.files.len(), 2);
    assert!(result.files[0].violations.is_empty());
    let renamed = &result.files[1];
    assert_eq!(renamed.file, UNKNOWN_FILE);
    assert_eq!((renamed.added, renamed.removed, renamed.context), (0, 0, 0));
    assert_eq!(renamed.percent_changed, 100.0);
    assert!(renamed
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::ExcessiveChange));
    assert!(!result.valid);
}

#[test]
fn small_file_edit_exceeds_threshold() {
    let diff = FilePatch::new("src/tiny.rs")
        .context("fn tiny() {")
        .removed("    a();")
        .removed("    b();")
        .added("    c();")
        .added("    d();")
        .render();

    let result = validate_patch(&diff, &PatchPolicy::new(30.0, true));
    let file = &result.files[0];
    assert_eq!((file.added, file.removed, file.context), (2, 2, 1));
    assert!((file.percent_changed - 133.333_333).abs() < 1e-3);
    assert!(result.has(ViolationKind::ExcessiveChange));
    assert!(!result.valid);
    assert_eq!(result.reason.as_deref(), Some("Mutation contract violations detected"));
}

#[test]
fn reindentation_is_whitespace_only_without_excessive_change() {
    let diff = with_context(FilePatch::new("src/big.rs"), 20)
        .replaced("if ready {", "    if ready {")
        .render();

    let result = validate_patch(&diff, &PatchPolicy::default());
    assert!(!result.valid);
    assert!(result.has(ViolationKind::WhitespaceOnly));
    assert!(!result.has(ViolationKind::ExcessiveChange));
    // formatting-only is a superset check, so strict mode flags it too
    assert!(result.has(ViolationKind::FormattingOnly));
}

#[test]
fn contextless_replacement_is_full_rewrite_at_any_threshold() {
    let diff = FilePatch::new("src/rewritten.rs")
        .removed("fn old() -> u32 { 1 }")
        .added("fn new() -> u64 { 2 }")
        .render();

    let result = validate_patch(&diff, &PatchPolicy::new(1.0e9, false));
    assert_eq!(kinds(&result), vec![ViolationKind::FullRewrite]);
    assert_eq!(result.violations[0].message, "No context lines detected; likely full rewrite");
}

#[test]
fn shuffled_imports_are_flagged() {
    let diff = with_context(FilePatch::new("src/app.ts"), 30)
        .removed("import { a } from './a';")
        .removed("import { b } from './b';")
        .added("import { b } from './b';")
        .added("import { a } from './a';")
        .render();

    let result = validate_patch(&diff, &PatchPolicy::default());
    assert_eq!(kinds(&result), vec![ViolationKind::ImportReorder]);
}

#[test]
fn comment_only_edit_is_formatting_only_in_strict_mode() {
    let diff = with_context(FilePatch::new("src/lib.rs"), 30)
        .replaced("let total = sum(xs); // naive", "let total = sum(xs); /* fast path later */")
        .render();

    let strict = validate_patch(&diff, &PatchPolicy::default());
    assert_eq!(kinds(&strict), vec![ViolationKind::FormattingOnly]);

    let lax = validate_patch(&diff, &PatchPolicy::new(30.0, false));
    assert!(lax.valid);
    assert_eq!(lax.reason, None);
}

#[test]
fn focused_edit_in_large_file_passes() {
    let diff = with_context(FilePatch::new("src/engine.rs"), 39)
        .replaced("let retries = 3;", "let retries = 5;")
        .render();

    let result = validate_patch(&diff, &PatchPolicy::default());
    assert!(result.valid, "unexpected: {:?}", result.violations);
    assert!(result.violations.is_empty());
    assert!((result.percent_changed - 5.0).abs() < 1e-9);
}

#[test]
fn multi_file_percent_is_mean_and_violations_keep_file_order() {
    let clean = with_context(FilePatch::new("a.rs"), 9).replaced("x = 1", "x = 2");
    let rewrite = FilePatch::new("b.rs").replaced("old()", "new()");
    let diff = multi_file_diff(&[clean, rewrite]);

    let result = validate_patch(&diff, &PatchPolicy::default());
    let names: Vec<&str> = result.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(names, vec!["a.rs", "b.rs"]);

    // a.rs: 2 * 100 / 10 = 20, b.rs: 2 * 100 / 1 = 200
    assert!((result.files[0].percent_changed - 20.0).abs() < 1e-9);
    assert!((result.files[1].percent_changed - 200.0).abs() < 1e-9);
    assert!((result.percent_changed - 110.0).abs() < 1e-9);

    assert!(result.files[0].violations.is_empty());
    assert!(result.violations.iter().all(|v| v.file.as_deref() == Some("b.rs")));
    assert_eq!(
        kinds(&result),
        vec![ViolationKind::ExcessiveChange, ViolationKind::FullRewrite]
    );
}

#[test]
fn new_file_counts_as_full_change() {
    let diff = "\
diff --git a/src/new.rs b/src/new.rs
new file mode 100644
--- /dev/null
+++ b/src/new.rs
@@ -0,0 +1,2 @@
+fn added() {}
+fn also_added() {}
";
    let result = validate_patch(diff, &PatchPolicy::default());
    assert_eq!(result.files[0].file, "src/new.rs");
    assert!((result.percent_changed - 100.0).abs() < f64::EPSILON);
    assert_eq!(kinds(&result), vec![ViolationKind::ExcessiveChange]);
}

#[test]
fn deleted_file_is_named_from_preimage() {
    let diff = "\
diff --git a/src/gone.rs b/src/gone.rs
deleted file mode 100644
--- a/src/gone.rs
+++ /dev/null
@@ -1 +0,0 @@
-fn gone() {}
";
    let result = validate_patch(diff, &PatchPolicy::default());
    assert_eq!(result.files[0].file, "src/gone.rs");
}

#[test]
fn plain_diff_without_git_header_is_one_file() {
    let diff = plain_unified_diff(
        "old/config.toml",
        "new/config.toml",
        &[" a = 1", "-b = 2", "+b = 3"],
    );
    let result = validate_patch(&diff, &PatchPolicy::new(500.0, true));
    assert_eq!(result.files.len(), 1);
    assert_eq!(result.files[0].file, "new/config.toml");
    assert!(result.valid);
}

#[test]
fn unnamed_section_reports_unknown_file() {
    let diff = "--- \n+++ \n@@ -1 +1 @@\n-a\n+b\n";
    let result = validate_patch(diff, &PatchPolicy::default());
    assert_eq!(result.files[0].file, UNKNOWN_FILE);
    assert!(result.violations.iter().all(|v| v.file.as_deref() == Some(UNKNOWN_FILE)));
}

#[test]
fn json_shape_matches_wire_contract() {
    let diff = FilePatch::new("f.rs").replaced("a", "b").render();
    let json = serde_json::to_value(validate_patch(&diff, &PatchPolicy::default())).unwrap();

    assert_eq!(json["valid"], false);
    assert_eq!(json["reason"], "Mutation contract violations detected");
    assert_eq!(json["files"][0]["file"], "f.rs");
    assert_eq!(json["violations"][0]["type"], "excessive-change");
    assert_eq!(json["violations"][0]["percent_changed"], 200.0);
    assert!(json["violations"][1].get("percent_changed").is_none());

    let clean = with_context(FilePatch::new("f.rs"), 40).replaced("a", "b").render();
    let json = serde_json::to_value(validate_patch(&clean, &PatchPolicy::default())).unwrap();
    assert!(json.get("reason").is_none());
}

#[test]
fn concurrent_validation_is_consistent() {
    let diff = multi_file_diff(&[
        with_context(FilePatch::new("a.rs"), 3).replaced("x", "  x"),
        FilePatch::new("b.rs").replaced("y", "z"),
    ]);
    let expected = validate_patch(&diff, &PatchPolicy::default());

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| validate_patch(&diff, &PatchPolicy::default())))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

proptest! {
    #[test]
    fn classifier_is_total_and_consistent(text in "(\\PC|\n){0,400}") {
        let result = validate_patch(&text, &PatchPolicy::default());
        prop_assert_eq!(result.valid, result.violations.is_empty());
        prop_assert_eq!(result.reason.is_some(), !result.valid);
        prop_assert!(result.percent_changed >= 0.0);
    }

    #[test]
    fn headers_with_arbitrary_bodies_never_panic(body in prop::collection::vec("[ +\\-@\\\\a-z]{0,12}", 0..40)) {
        let mut text = String::from("diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n");
        for line in &body {
            text.push_str(line);
            text.push('\n');
        }
        let result = validate_patch(&text, &PatchPolicy::default());
        prop_assert_eq!(result.files.len(), 1);
        let total: usize = result.files.iter().map(|f| f.violations.len()).sum();
        prop_assert_eq!(total, result.violations.len());
    }
}
