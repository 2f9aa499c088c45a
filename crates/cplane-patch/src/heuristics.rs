//! Line-textual drift detectors
//!
//! None of these parse a language. They compare the added and removed lines
//! of one file after progressively more aggressive normalization, which keeps
//! them deterministic and usable on any diff. The comment stripping in
//! [`strip_formatting`] is approximate: it knows `//` and `/* */` and nothing
//! about strings, so `"http://x"` loses its tail.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//.*$").expect("valid regex"));
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*.*?\*/").expect("valid regex"));

/// Trim and collapse internal whitespace runs to one space
pub(crate) fn normalize_line(line: &str) -> String {
    WHITESPACE_RUN.replace_all(line.trim(), " ").into_owned()
}

/// Remove `//` and single-line `/* */` comments, then normalize whitespace
pub(crate) fn strip_formatting(line: &str) -> String {
    let without_line = LINE_COMMENT.replace(line, "");
    let without_block = BLOCK_COMMENT.replace_all(&without_line, "");
    normalize_line(&without_block)
}

/// Whether a line looks like a dependency import
///
/// Recognizes `import …`, `using …`, Rust `use …`, C `#include …` and
/// Python `from … import …`.
pub(crate) fn is_import_line(line: &str) -> bool {
    let l = line.trim();
    l.starts_with("import ")
        || l.starts_with("using ")
        || l.starts_with("use ")
        || l.starts_with("#include ")
        || (l.starts_with("from ") && l.contains(" import "))
}

/// Added and removed lines are equal one-for-one after `normalize`
fn same_sequence<F>(added: &[&str], removed: &[&str], normalize: F, drop_empty: bool) -> bool
where
    F: Fn(&str) -> String,
{
    let prepare = |lines: &[&str]| -> Vec<String> {
        lines
            .iter()
            .map(|l| normalize(*l))
            .filter(|l| !drop_empty || !l.is_empty())
            .collect()
    };
    let a = prepare(added);
    let r = prepare(removed);
    !a.is_empty() && a == r
}

/// Every change is re-indentation or re-spacing of the same lines
pub(crate) fn is_whitespace_only(added: &[&str], removed: &[&str]) -> bool {
    same_sequence(added, removed, normalize_line, false)
}

/// Every change vanishes once comments and whitespace are ignored
pub(crate) fn is_formatting_only(added: &[&str], removed: &[&str]) -> bool {
    same_sequence(added, removed, strip_formatting, true)
}

/// The removed imports reappear as added imports, in some other order
pub(crate) fn is_import_reorder(added: &[&str], removed: &[&str]) -> bool {
    let sorted_imports = |lines: &[&str]| -> Vec<String> {
        let mut out: Vec<String> = lines
            .iter()
            .filter(|l| is_import_line(l))
            .map(|l| normalize_line(l))
            .collect();
        out.sort();
        out
    };
    let removed_imports = sorted_imports(removed);
    !removed_imports.is_empty() && removed_imports == sorted_imports(added)
}
