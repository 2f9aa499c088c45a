//! Unified-diff reading: format gate, per-file sections, line classes
//!
//! This is deliberately shallow. Hunk headers are not interpreted; every line
//! is classified by its first character, which is all the heuristics need.

const FILE_HEADER: &str = "diff --git ";

/// Whether `patch` carries all three unified-diff markers
pub(crate) fn is_unified_diff(patch: &str) -> bool {
    patch.contains("--- ") && patch.contains("+++ ") && patch.contains("@@")
}

/// Split a patch into per-file sections at `diff --git ` lines
///
/// Text before the first header (a commit message, say) is dropped. Without
/// any header the whole patch is a single section.
pub(crate) fn split_file_sections(patch: &str) -> Vec<&str> {
    let starts: Vec<usize> = line_starts(patch)
        .filter(|&i| patch[i..].starts_with(FILE_HEADER))
        .collect();

    if starts.is_empty() {
        return vec![patch];
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(patch.len());
            &patch[start..end]
        })
        .collect()
}

fn line_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        text.match_indices('\n')
            .map(|(i, _)| i + 1)
            .filter(move |&i| i < text.len()),
    )
}

/// Display path of a section: the `+++` target, or the `---` source for a
/// deletion, without `a/`/`b/` prefixes or timestamps
pub(crate) fn file_name(section: &str) -> Option<String> {
    let post = header_path(section, "+++")?;
    if post != "/dev/null" {
        return Some(strip_side_prefix(post, "b/").to_string());
    }
    header_path(section, "---")
        .filter(|pre| *pre != "/dev/null")
        .map(|pre| strip_side_prefix(pre, "a/").to_string())
}

fn header_path<'a>(section: &'a str, marker: &str) -> Option<&'a str> {
    section.lines().find_map(|line| {
        let rest = line.strip_prefix(marker)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        // `diff -u` appends "\t<timestamp>"
        let path = rest.trim_start().split('\t').next()?.trim_end();
        let path = path.trim_matches('"');
        (!path.is_empty()).then_some(path)
    })
}

fn strip_side_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).filter(|p| !p.is_empty()).unwrap_or(path)
}

/// Classified lines of one file section
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SectionLines<'a> {
    /// Added lines, `+` stripped
    pub(crate) added: Vec<&'a str>,
    /// Removed lines, `-` stripped
    pub(crate) removed: Vec<&'a str>,
    /// Unchanged lines shown for context
    pub(crate) context: usize,
}

/// Classify every line of a section by its diff prefix
///
/// `+++`/`---` file markers, `@@` hunk headers, `\ No newline` markers and
/// git metadata lines are structural and counted nowhere.
pub(crate) fn classify(section: &str) -> SectionLines<'_> {
    let mut out = SectionLines::default();
    for line in section.lines() {
        if let Some(text) = line.strip_prefix('+') {
            if !line.starts_with("+++") {
                out.added.push(text);
            }
        } else if let Some(text) = line.strip_prefix('-') {
            if !line.starts_with("---") {
                out.removed.push(text);
            }
        } else if line.starts_with(' ') {
            out.context += 1;
        }
    }
    out
}
