/// Core domain types: added lines, markdown structure, issues, and scores.
use serde::{Deserialize, Serialize};

/// One inserted line in the new version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedLine {
    /// Line text without the leading `+`.
    pub content: String,
    /// One-based line number in the new file.
    pub line_number: u32,
}

/// Added lines for a single markdown file, in hunk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanges {
    /// Lines inserted into the file.
    pub lines: Vec<AddedLine>,
    /// Path from the `+++ b/` header.
    pub path: String,
}

impl FileChanges {
    /// Added lines joined into a reviewable document.
    pub fn text(&self) -> String {
        return self
            .lines
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}

/// Markdown files touched by a diff, in first-seen header order.
/// A file named in a header but without additions is present with no lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeSet {
    /// One entry per distinct markdown path.
    pub files: Vec<FileChanges>,
}

impl FileChangeSet {
    /// Look up the changes for a path.
    pub fn get(&self, path: &str) -> Option<&FileChanges> {
        return self.files.iter().find(|f| f.path == path);
    }

    /// Whether no markdown file was touched.
    pub fn is_empty(&self) -> bool {
        return self.files.is_empty();
    }

    /// Number of markdown files touched.
    pub fn len(&self) -> usize {
        return self.files.len();
    }

    /// Position of the entry for `path`, creating an empty one if needed.
    pub(crate) fn open(&mut self, path: &str) -> usize {
        if let Some(pos) = self.files.iter().position(|f| f.path == path) {
            return pos;
        }
        self.files.push(FileChanges { lines: Vec::new(), path: path.to_string() });
        return self.files.len().saturating_sub(1);
    }

    /// Append an added line to the entry at `index`.
    pub(crate) fn record(&mut self, index: usize, line_number: u32, content: &str) {
        if let Some(file) = self.files.get_mut(index) {
            file.lines.push(AddedLine { content: content.to_string(), line_number });
        }
    }
}

/// A fenced code block, body bounded to a short preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Whether the fence carried a language tag.
    pub has_language_tag: bool,
    /// Language tag after the opening fence, empty when absent.
    pub language: String,
    /// First characters of the trimmed block body.
    pub preview: String,
}

/// An ATX heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 to 6.
    pub level: u8,
    /// Trimmed heading text.
    pub text: String,
}

/// An embedded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Trimmed alternative text, possibly empty.
    pub alt: String,
    /// Trimmed image target.
    pub url: String,
}

/// An inline link that is not an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Trimmed link text.
    pub text: String,
    /// Trimmed link target.
    pub url: String,
}

/// Structural summary of a markdown document handed to the judge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMarkdownStructure {
    /// Fenced code blocks in source order.
    pub code_blocks: Vec<CodeBlock>,
    /// Headings in source order.
    pub headings: Vec<Heading>,
    /// Images in source order.
    pub images: Vec<Image>,
    /// Links in source order.
    pub links: Vec<Link>,
    /// Raw pipe-table blocks in source order.
    pub tables: Vec<String>,
}

/// Impact of an accessibility issue. Drives a fixed penalty weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks access for some readers.
    High,
    /// Minor friction.
    Low,
    /// Degrades access noticeably.
    Medium,
}

impl Severity {
    /// Severities in breakdown order.
    pub const ORDERED: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::High => "high",
            Self::Low => "low",
            Self::Medium => "medium",
        };
    }

    /// Parse a wire name, tolerating surrounding whitespace and case.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        return Self::ORDERED.into_iter().find(|s| s.as_str().eq_ignore_ascii_case(trimmed));
    }

    /// Points deducted per issue of this severity.
    pub const fn penalty(self) -> u32 {
        return match self {
            Self::High => 15,
            Self::Low => 3,
            Self::Medium => 8,
        };
    }

    /// Capitalized name for report rows.
    pub const fn title(self) -> &'static str {
        return match self {
            Self::High => "High",
            Self::Low => "Low",
            Self::Medium => "Medium",
        };
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.as_str());
    }
}

/// A single accessibility finding accepted from the judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Evidence snippet or location.
    pub evidence: String,
    /// Why the issue matters to readers.
    pub explanation: String,
    /// Unique within one review result.
    pub id: String,
    /// Impact level.
    pub severity: Severity,
    /// Concrete fix.
    pub suggestion: String,
    /// Short label.
    pub title: String,
}

/// Deduction for one severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyItem {
    /// Issues in this bucket.
    pub count: u32,
    /// Weight per issue.
    pub penalty_per_item: u32,
    /// Bucket.
    pub severity: Severity,
    /// `count * penalty_per_item`.
    pub subtotal: u32,
}

/// Transparent score derivation: base minus penalties, clamped at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Always 100.
    pub base: u32,
    /// Resulting score, 0 to 100.
    #[serde(rename = "final")]
    pub final_score: u32,
    /// One item per severity, high then medium then low.
    pub penalties: Vec<PenaltyItem>,
}

/// Validated review of one markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Custom rules note, when rules were applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_rules: Option<String>,
    /// Accepted findings with unique ids.
    pub issues: Vec<Issue>,
    /// Equal to `score_breakdown.final_score`.
    pub score: u32,
    /// How the score was derived.
    pub score_breakdown: ScoreBreakdown,
    /// Three to six short summary lines.
    pub summary_bullets: Vec<String>,
}
