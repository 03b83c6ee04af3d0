//! Unified diff parsing: added lines of markdown files, with new-file line numbers.
//!
//! The parser is a three-state machine driven one input line at a time.
//! Malformed input never fails; it only suppresses recording until the next
//! valid file or hunk header.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::types::FileChangeSet;

/// `@@ -<old>[,<count>] +<new>[,<count>] @@`, capturing the new start line and count.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").expect("valid hunk regex");
});

/// Prefix of the new-file header line.
const NEW_FILE_PREFIX: &str = "+++ ";

/// Prefix of the new-file path inside the header.
const NEW_PATH_PREFIX: &str = "b/";

/// Where the parser stands between input lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseState {
    /// A markdown file is current but no valid hunk header has been seen.
    AwaitingHunk {
        /// Index of the file entry in the result.
        file: usize,
    },
    /// Inside a hunk of a markdown file.
    InHunk {
        /// Index of the file entry in the result.
        file: usize,
        /// New-file line number the next non-deleted line will occupy.
        next_line: u32,
    },
    /// No markdown file is current; lines are ignored.
    NoFile,
}

/// Parse a unified diff into the added lines of every markdown file it touches.
///
/// Files keep first-seen order and a file named twice accumulates into one
/// entry. An empty diff yields an empty set.
pub fn parse(diff_text: &str) -> FileChangeSet {
    let mut changes = FileChangeSet::default();
    let mut state = ParseState::NoFile;

    for line in diff_text.lines() {
        state = step(state, line, &mut changes);
    }

    debug!(files = changes.len(), "parsed diff");
    return changes;
}

/// Apply one input line to the parser state.
fn step(state: ParseState, line: &str, changes: &mut FileChangeSet) -> ParseState {
    if let Some(header) = line.strip_prefix(NEW_FILE_PREFIX) {
        return open_file(header, changes);
    }

    if line.starts_with("@@") {
        return match state {
            ParseState::NoFile => ParseState::NoFile,
            ParseState::AwaitingHunk { file } | ParseState::InHunk { file, .. } => {
                match parse_hunk_start(line) {
                    Some(next_line) => ParseState::InHunk { file, next_line },
                    None => {
                        debug!(line, "skipping malformed hunk header");
                        ParseState::AwaitingHunk { file }
                    },
                }
            },
        };
    }

    let ParseState::InHunk { file, next_line } = state else {
        return state;
    };

    let next_line = match classify_body_line(line) {
        BodyLine::Added(content) => {
            changes.record(file, next_line, content);
            next_line.saturating_add(1)
        },
        BodyLine::Context => next_line.saturating_add(1),
        BodyLine::Deleted | BodyLine::Marker => next_line,
    };
    return ParseState::InHunk { file, next_line };
}

/// Kind of a line inside a hunk.
enum BodyLine<'a> {
    /// Inserted line, prefix stripped.
    Added(&'a str),
    /// Unchanged line present in both versions.
    Context,
    /// Removed line, or an old-file `---` header.
    Deleted,
    /// `\ No newline at end of file`.
    Marker,
}

/// Classify a hunk body line by its prefix.
fn classify_body_line(line: &str) -> BodyLine<'_> {
    if let Some(content) = line.strip_prefix('+') {
        return BodyLine::Added(content);
    }
    if line.starts_with('-') {
        return BodyLine::Deleted;
    }
    if line.starts_with('\\') {
        return BodyLine::Marker;
    }
    return BodyLine::Context;
}

/// Handle a `+++ ` header: open a markdown entry or drop to `NoFile`.
fn open_file(header: &str, changes: &mut FileChangeSet) -> ParseState {
    let Some(path) = header.strip_prefix(NEW_PATH_PREFIX) else {
        return ParseState::NoFile;
    };
    // GNU diff appends a tab and a timestamp after the path.
    let path = path.split('\t').next().unwrap_or_default().trim_end();
    if !is_markdown_path(path) {
        debug!(path, "ignoring non-markdown file");
        return ParseState::NoFile;
    }
    return ParseState::AwaitingHunk { file: changes.open(path) };
}

/// Extract the new-file start line from a hunk header.
///
/// Start `0` is only valid for an empty new range (`+0,0`); anything else
/// would number added lines from zero.
fn parse_hunk_start(line: &str) -> Option<u32> {
    let caps = HUNK_HEADER.captures(line)?;
    let start: u32 = caps.get(1)?.as_str().parse().ok()?;
    let count: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    if start == 0 && count > 0 {
        return None;
    }
    return Some(start);
}

/// Whether a path names a markdown document.
pub fn is_markdown_path(path: &str) -> bool {
    return Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"));
}
