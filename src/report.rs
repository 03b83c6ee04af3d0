//! Report rendering: the multi-file PR review, its JSON twin, and the
//! single-document report.
//!
//! Output depends only on the inputs, so identical reviews render identically.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Error;
use crate::review::{FileFailure, FileReview, path_order};
use crate::types::{ReviewResult, Severity};

/// Title of the multi-file report.
const REPORT_TITLE: &str = "# Accessibility PR Review";

/// Aggregate statistics over successfully reviewed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Mean score rounded to the nearest integer, ties to even.
    pub average_score: u32,
    /// Files that failed review.
    pub failed_files: usize,
    /// Issues of each severity.
    pub severity_totals: SeverityTotals,
    /// Files reviewed successfully.
    pub reviewed_files: usize,
    /// Issues across all files.
    pub total_issues: usize,
}

/// Issue counts keyed by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityTotals {
    pub high: usize,
    pub low: usize,
    pub medium: usize,
}

impl SeverityTotals {
    /// Count of issues with the given severity.
    pub const fn get(&self, severity: Severity) -> usize {
        return match severity {
            Severity::High => self.high,
            Severity::Low => self.low,
            Severity::Medium => self.medium,
        };
    }

    fn add(&mut self, severity: Severity) {
        let slot = match severity {
            Severity::High => &mut self.high,
            Severity::Low => &mut self.low,
            Severity::Medium => &mut self.medium,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Compute overview statistics. `None` when nothing was reviewed.
pub fn overview(reviews: &[FileReview], failures: &[FileFailure]) -> Option<Overview> {
    if reviews.is_empty() {
        return None;
    }

    let scores = reviews.iter().map(|r| u64::from(r.result.score));
    let count = u64::try_from(reviews.len()).unwrap_or(u64::MAX);
    let average = round_half_even(scores.sum(), count);

    let mut severity_totals = SeverityTotals::default();
    for issue in reviews.iter().flat_map(|r| &r.result.issues) {
        severity_totals.add(issue.severity);
    }

    return Some(Overview {
        average_score: u32::try_from(average).unwrap_or(u32::MAX),
        failed_files: failures.len(),
        severity_totals,
        reviewed_files: reviews.len(),
        total_issues: reviews.iter().map(|r| r.result.issues.len()).sum(),
    });
}

/// `sum / count` rounded to nearest, exact halves to the even neighbour.
fn round_half_even(sum: u64, count: u64) -> u64 {
    let Some(quotient) = sum.checked_div(count) else {
        return 0;
    };
    let remainder = sum.checked_rem(count).unwrap_or(0);
    let twice = remainder.saturating_mul(2);
    let round_up = twice > count || (twice == count && quotient % 2 == 1);
    return if round_up { quotient.saturating_add(1) } else { quotient };
}

/// Render the multi-file Markdown report.
///
/// Reviews are ordered case-insensitively by path. With no files at all the
/// report only states that nothing was provided.
pub fn aggregate(reviews: &[FileReview], failures: &[FileFailure]) -> String {
    let mut lines: Vec<String> = vec![REPORT_TITLE.to_string(), String::new()];

    let received = reviews.len().saturating_add(failures.len());
    if received == 0 {
        lines.push("- No modified files were provided.".to_string());
        return finish(&lines);
    }

    lines.push(format!("- Files received: {received}"));
    lines.push(String::new());

    lines.extend(overview_section(reviews, failures));

    let mut ordered: Vec<&FileReview> = reviews.iter().collect();
    ordered.sort_by(|a, b| path_order(&a.path, &b.path));
    for review in ordered {
        lines.extend(file_section(&review.path, &review.result));
    }

    if !failures.is_empty() {
        lines.push("## Files With Review Errors".to_string());
        lines.push(String::new());
        for failure in failures {
            lines.push(format!("- `{}`: {}", failure.path, failure.error));
        }
        lines.push(String::new());
    }

    return finish(&lines);
}

/// Join lines, trim trailing blank space, end with one newline.
fn finish(lines: &[String]) -> String {
    let mut out = lines.join("\n").trim().to_string();
    out.push('\n');
    return out;
}

fn overview_section(reviews: &[FileReview], failures: &[FileFailure]) -> Vec<String> {
    let mut lines = vec!["## Overview".to_string(), String::new()];

    let Some(stats) = overview(reviews, failures) else {
        lines.push("- No files were successfully reviewed.".to_string());
        lines.push(String::new());
        return lines;
    };

    let totals = Severity::ORDERED
        .into_iter()
        .map(|severity| format!("{severity}={}", stats.severity_totals.get(severity)))
        .collect::<Vec<_>>()
        .join(", ");

    lines.push(format!("- Successfully reviewed files: {}", stats.reviewed_files));
    lines.push(format!("- Files with review errors: {}", stats.failed_files));
    lines.push(format!("- Average score: {}/100", stats.average_score));
    lines.push(format!("- Total issues: {}", stats.total_issues));
    lines.push(format!("- Severity totals: {totals}"));
    lines.push(String::new());
    return lines;
}

fn file_section(path: &str, result: &ReviewResult) -> Vec<String> {
    let mut lines = vec![
        format!("## File: `{path}`"),
        String::new(),
        format!("- Score: {}/100", result.score),
        String::new(),
        "### Summary".to_string(),
    ];
    lines.extend(result.summary_bullets.iter().map(|b| format!("- {b}")));

    lines.push(String::new());
    lines.push("### Findings".to_string());
    if result.issues.is_empty() {
        lines.push("- No accessibility issues found.".to_string());
    }
    for issue in &result.issues {
        lines.push(format!(
            "- **{} | {} | {}**",
            issue.id,
            issue.severity.as_str().to_uppercase(),
            issue.title
        ));
        lines.push(format!("  - Why it matters: {}", issue.explanation));
        lines.push(format!("  - Evidence: {}", issue.evidence));
        lines.push(format!("  - Suggested fix: {}", issue.suggestion));
    }

    lines.push(String::new());
    lines.push("### Score Breakdown".to_string());
    lines.push(format!("- Base: {}", result.score_breakdown.base));
    for p in &result.score_breakdown.penalties {
        lines.push(format!(
            "- {}: {} x {} = -{}",
            p.severity.title(),
            p.count,
            p.penalty_per_item,
            p.subtotal
        ));
    }
    lines.push(format!("- Final: {}", result.score_breakdown.final_score));

    if let Some(rules) = &result.applied_rules {
        lines.push(String::new());
        lines.push("### Applied Rules".to_string());
        lines.push(format!("- {rules}"));
    }

    lines.push(String::new());
    return lines;
}

/// JSON form of the multi-file report.
#[derive(Serialize)]
struct JsonReport<'a> {
    /// Files that failed review.
    failures: &'a [FileFailure],
    /// Statistics, absent when nothing was reviewed.
    overview: Option<Overview>,
    /// Reviewed files in path order.
    reviews: Vec<&'a FileReview>,
}

/// Render the multi-file report as pretty JSON.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
pub fn aggregate_json(reviews: &[FileReview], failures: &[FileFailure]) -> Result<String, Error> {
    let mut ordered: Vec<&FileReview> = reviews.iter().collect();
    ordered.sort_by(|a, b| path_order(&a.path, &b.path));
    let report = JsonReport { failures, overview: overview(reviews, failures), reviews: ordered };
    let mut out = serde_json::to_string_pretty(&report)?;
    out.push('\n');
    return Ok(out);
}

/// Render the report for a single reviewed document.
pub fn render_document_report(result: &ReviewResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Accessibility Review Report\n");
    let _ = writeln!(out, "## Overall Score: {}/100\n", result.score);
    out.push_str("## Quick Summary\n");
    for bullet in &result.summary_bullets {
        let _ = writeln!(out, "- {bullet}");
    }

    out.push_str("\n## Findings\n");
    if result.issues.is_empty() {
        out.push_str("- No accessibility issues were identified in this review.\n");
    }
    for issue in &result.issues {
        let _ = writeln!(
            out,
            "### {} - {} ({})",
            issue.id,
            issue.title,
            issue.severity.as_str().to_uppercase()
        );
        let _ = writeln!(out, "Why it matters: {}", issue.explanation);
        let _ = writeln!(out, "Evidence: {}", issue.evidence);
        let _ = writeln!(out, "Suggested fix: {}\n", issue.suggestion);
    }

    out.push_str("## Scoring Details\n");
    let _ = writeln!(out, "- Base score: {}", result.score_breakdown.base);
    for p in &result.score_breakdown.penalties {
        let _ = writeln!(
            out,
            "- {}: {} x {} = -{}",
            p.severity.title(),
            p.count,
            p.penalty_per_item,
            p.subtotal
        );
    }
    let _ = writeln!(out, "- Final score: {}", result.score_breakdown.final_score);

    if let Some(rules) = &result.applied_rules {
        let _ = write!(out, "\n## Applied Custom Rules\n{rules}\n");
    }

    let mut trimmed = out.trim().to_string();
    trimmed.push('\n');
    return trimmed;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::scoring;
    use crate::types::Issue;

    fn bullets() -> Vec<String> {
        return vec!["First.".into(), "Second.".into(), "Third.".into()];
    }

    fn issue(id: &str, severity: Severity) -> Issue {
        Issue {
            evidence: "![](x.png)".into(),
            explanation: "Screen readers cannot describe it.".into(),
            id: id.into(),
            severity,
            suggestion: "Add alt text.".into(),
            title: "Missing alt text".into(),
        }
    }

    fn review(path: &str, issues: Vec<Issue>) -> FileReview {
        FileReview { path: path.into(), result: scoring::assemble(issues, bullets(), None) }
    }

    #[test]
    fn no_files_yields_minimal_report() {
        let report = aggregate(&[], &[]);
        assert_eq!(report, "# Accessibility PR Review\n\n- No modified files were provided.\n");
        assert!(!report.contains("## Overview"));
        assert!(!report.contains("## File:"));
    }

    #[test]
    fn overview_counts_issues_and_averages_scores() {
        let reviews = vec![
            review("b.md", vec![issue("A", Severity::High), issue("B", Severity::Low)]),
            review("a.md", Vec::new()),
        ];
        let failures = vec![FileFailure { error: "timeout".into(), path: "c.md".into() }];
        let stats = overview(&reviews, &failures).unwrap();
        assert_eq!(stats.reviewed_files, 2);
        assert_eq!(stats.failed_files, 1);
        assert_eq!(stats.total_issues, 2);
        // (82 + 100) / 2 = 91
        assert_eq!(stats.average_score, 91);
        assert_eq!(stats.severity_totals, SeverityTotals { high: 1, low: 1, medium: 0 });
    }

    #[test]
    fn averages_round_half_to_even() {
        assert_eq!(round_half_even(125, 2), 62);
        assert_eq!(round_half_even(127, 2), 64);
        assert_eq!(round_half_even(200, 3), 67);
        assert_eq!(round_half_even(10, 0), 0);
    }

    #[test]
    fn report_sections_follow_case_insensitive_order() {
        let reviews = vec![review("zeta.md", Vec::new()), review("Alpha.md", vec![issue("ISSUE-1", Severity::Medium)])];
        let failures = vec![FileFailure { error: "judge request failed (500): boom".into(), path: "gamma.md".into() }];
        let report = aggregate(&reviews, &failures);

        let alpha = report.find("## File: `Alpha.md`").unwrap();
        let zeta = report.find("## File: `zeta.md`").unwrap();
        let errors = report.find("## Files With Review Errors").unwrap();
        assert!(alpha < zeta && zeta < errors);

        assert!(report.contains("- Files received: 3"));
        assert!(report.contains("- Average score: 96/100"));
        assert!(report.contains("- Severity totals: high=0, medium=1, low=0"));
        assert!(report.contains("- **ISSUE-1 | MEDIUM | Missing alt text**"));
        assert!(report.contains("- Medium: 1 x 8 = -8"));
        assert!(report.contains("- `gamma.md`: judge request failed (500): boom"));
        assert!(report.ends_with("boom\n"));
    }

    #[test]
    fn only_failures_still_reports_them() {
        let failures = vec![FileFailure { error: "missing API key".into(), path: "a.md".into() }];
        let report = aggregate(&[], &failures);
        assert!(report.contains("- No files were successfully reviewed."));
        assert!(report.contains("- `a.md`: missing API key"));
    }

    #[test]
    fn applied_rules_are_rendered() {
        let mut r = review("a.md", Vec::new());
        r.result.applied_rules = Some("Alt text must end with a period.".into());
        let report = aggregate(&[r], &[]);
        assert!(report.contains("### Applied Rules\n- Alt text must end with a period."));
    }

    #[test]
    fn aggregation_is_reproducible() {
        let reviews = vec![review("a.md", vec![issue("X", Severity::High)])];
        assert_eq!(aggregate(&reviews, &[]), aggregate(&reviews, &[]));
    }

    #[test]
    fn json_report_carries_overview() {
        let json = aggregate_json(&[review("a.md", Vec::new())], &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overview"]["average_score"], 100);
        assert_eq!(value["reviews"][0]["result"]["score_breakdown"]["final"], 100);
    }

    #[test]
    fn json_severity_totals_use_named_keys() {
        let reviews = [review("a.md", vec![issue("A", Severity::High), issue("B", Severity::High)])];
        let json = aggregate_json(&reviews, &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let totals = &value["overview"]["severity_totals"];
        assert_eq!(totals["high"], 2);
        assert_eq!(totals["medium"], 0);
        assert_eq!(totals["low"], 0);
    }

    #[test]
    fn document_report_lists_findings_and_scoring() {
        let result = scoring::assemble(vec![issue("ISSUE-1", Severity::High)], bullets(), None);
        let report = render_document_report(&result);
        assert!(report.starts_with("# Accessibility Review Report\n\n## Overall Score: 85/100\n"));
        assert!(report.contains("### ISSUE-1 - Missing alt text (HIGH)"));
        assert!(report.contains("- High: 1 x 15 = -15"));
        assert!(report.ends_with("- Final score: 85\n"));
    }
}
