//! Per-file review of a diff's markdown changes.

use serde::Serialize;
use tracing::{info, warn};

use crate::judge::{self, Judge, ReviewSettings};
use crate::types::{FileChangeSet, ReviewResult};

/// A file whose review succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct FileReview {
    /// Markdown path from the diff.
    pub path: String,
    /// Validated review.
    pub result: ReviewResult,
}

/// A file whose review failed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Failure description.
    pub error: String,
    /// Markdown path from the diff.
    pub path: String,
}

/// Outcome of reviewing every file in a change set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewOutcome {
    /// Files that could not be reviewed, in review order.
    pub failures: Vec<FileFailure>,
    /// Reviewed files in case-insensitive path order.
    pub reviews: Vec<FileReview>,
}

/// Order paths case-insensitively, ties broken by exact text.
pub fn path_order(a: &str, b: &str) -> std::cmp::Ordering {
    return a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b));
}

/// Review the added text of each markdown file, one at a time, in sorted order.
/// A failing file is recorded and the rest continue.
pub fn review_changes(
    judge: &dyn Judge,
    changes: &FileChangeSet,
    rules_text: Option<&str>,
    settings: ReviewSettings,
) -> ReviewOutcome {
    let mut files: Vec<_> = changes.files.iter().collect();
    files.sort_by(|a, b| path_order(&a.path, &b.path));

    let mut outcome = ReviewOutcome::default();
    for file in files {
        info!(path = %file.path, lines = file.lines.len(), "reviewing");
        match judge::review_document(judge, &file.text(), rules_text, settings) {
            Ok(result) => outcome.reviews.push(FileReview { path: file.path.clone(), result }),
            Err(e) => {
                warn!(path = %file.path, error = %e, "review failed");
                outcome.failures.push(FileFailure { error: e.to_string(), path: file.path.clone() });
            },
        }
    }
    return outcome;
}
