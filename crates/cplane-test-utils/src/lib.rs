//! Testing utilities for cplane workspace
//!
//! Shared test helpers: throwaway worktrees and a unified-diff builder.

#![allow(missing_docs)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory standing in for a repository worktree
#[derive(Debug)]
pub struct TempWorktree {
    dir: TempDir,
}

impl TempWorktree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp worktree"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// All `*.json` files (temp files included) below `rel`
    pub fn json_files_under(&self, rel: impl AsRef<Path>) -> Vec<PathBuf> {
        let mut out = Vec::new();
        collect_json(&self.join(rel), &mut out);
        out.sort();
        out
    }
}

impl Default for TempWorktree {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_json(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_json(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Context(String),
    Added(String),
    Removed(String),
}

/// Builder for one file's section of a git-style unified diff
#[derive(Debug, Clone)]
pub struct FilePatch {
    path: String,
    lines: Vec<Line>,
}

impl FilePatch {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn context(mut self, line: &str) -> Self {
        self.lines.push(Line::Context(line.to_string()));
        self
    }

    pub fn added(mut self, line: &str) -> Self {
        self.lines.push(Line::Added(line.to_string()));
        self
    }

    pub fn removed(mut self, line: &str) -> Self {
        self.lines.push(Line::Removed(line.to_string()));
        self
    }

    /// Replace `old` with `new` (one removal followed by one addition)
    pub fn replaced(self, old: &str, new: &str) -> Self {
        self.removed(old).added(new)
    }

    /// Render with a `diff --git` header and a single hunk
    pub fn render(&self) -> String {
        let old_len = self
            .lines
            .iter()
            .filter(|l| !matches!(l, Line::Added(_)))
            .count();
        let new_len = self
            .lines
            .iter()
            .filter(|l| !matches!(l, Line::Removed(_)))
            .count();

        let mut out = String::new();
        let _ = writeln!(out, "diff --git a/{p} b/{p}", p = self.path);
        let _ = writeln!(out, "index 1111111..2222222 100644");
        let _ = writeln!(out, "--- a/{}", self.path);
        let _ = writeln!(out, "+++ b/{}", self.path);
        let _ = writeln!(out, "@@ -1,{old_len} +1,{new_len} @@");
        for line in &self.lines {
            let _ = match line {
                Line::Context(text) => writeln!(out, " {text}"),
                Line::Added(text) => writeln!(out, "+{text}"),
                Line::Removed(text) => writeln!(out, "-{text}"),
            };
        }
        out
    }
}

/// Concatenate several file sections into one multi-file diff
pub fn multi_file_diff(files: &[FilePatch]) -> String {
    files.iter().map(FilePatch::render).collect()
}

/// A plain (`diff -u`) single-file diff without a `diff --git` header
pub fn plain_unified_diff(old_path: &str, new_path: &str, body: &[&str]) -> String {
    let mut out = format!("--- {old_path}\n+++ {new_path}\n@@ -1 +1 @@\n");
    for line in body {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_git_style_header_and_counts() {
        let diff = FilePatch::new("src/lib.rs")
            .context("fn a() {}")
            .replaced("let x = 1;", "let x = 2;")
            .render();
        assert!(diff.starts_with("diff --git a/src/lib.rs b/src/lib.rs\n"));
        assert!(diff.contains("\n+++ b/src/lib.rs\n"));
        assert!(diff.contains("\n@@ -1,2 +1,2 @@\n"));
        assert!(diff.ends_with("-let x = 1;\n+let x = 2;\n"));
    }

    #[test]
    fn worktree_lists_nested_json() {
        let wt = TempWorktree::new();
        std::fs::create_dir_all(wt.join("a/b")).unwrap();
        std::fs::write(wt.join("a/b/x.json"), "{}").unwrap();
        std::fs::write(wt.join("a/y.txt"), "").unwrap();
        assert_eq!(wt.json_files_under("a"), vec![wt.join("a/b/x.json")]);
    }
}
