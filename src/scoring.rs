//! Deterministic scoring and issue-id normalization.
//!
//! The score of a review is always derived here from the issue list. Any score
//! proposed by the judge is discarded.

use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::types::{Issue, PenaltyItem, ReviewResult, ScoreBreakdown, Severity};

/// Starting score before penalties.
pub const BASE_SCORE: u32 = 100;

/// Fewest summary bullets a result may carry.
pub const MIN_SUMMARY_BULLETS: usize = 3;

/// Most summary bullets a result may carry.
pub const MAX_SUMMARY_BULLETS: usize = 6;

/// Compute the penalty breakdown for a set of issues.
///
/// Penalties are listed high, medium, low, zero counts included, and the final
/// score is clamped at zero.
pub fn score(issues: &[Issue]) -> ScoreBreakdown {
    let mut penalties = Vec::with_capacity(Severity::ORDERED.len());
    let mut total = 0_u32;

    for severity in Severity::ORDERED {
        let count = issues.iter().filter(|i| i.severity == severity).count();
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        let penalty_per_item = severity.penalty();
        let subtotal = count.saturating_mul(penalty_per_item);
        total = total.saturating_add(subtotal);
        penalties.push(PenaltyItem { count, penalty_per_item, severity, subtotal });
    }

    return ScoreBreakdown {
        base: BASE_SCORE,
        final_score: BASE_SCORE.saturating_sub(total),
        penalties,
    };
}

/// Assign stable, unique ids.
///
/// A missing or blank id becomes `ISSUE-<n>` from its 1-based position. An id
/// already taken gets `-<occurrence>` appended, counting up until free. Already
/// unique ids pass through unchanged.
pub fn normalize_issue_ids(raw_ids: &[Option<&str>]) -> Vec<String> {
    let mut occurrences: HashMap<String, u32> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut ids = Vec::with_capacity(raw_ids.len());

    for (idx, raw) in raw_ids.iter().enumerate() {
        let base = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => format!("ISSUE-{}", idx.saturating_add(1)),
        };

        let seen = occurrences.entry(base.clone()).or_insert(0);
        *seen = seen.saturating_add(1);

        let mut candidate = base.clone();
        let mut occurrence = *seen;
        while taken.contains(&candidate) {
            occurrence = occurrence.max(2);
            candidate = format!("{base}-{occurrence}");
            occurrence = occurrence.saturating_add(1);
        }
        *seen = (*seen).max(occurrence.saturating_sub(1));

        taken.insert(candidate.clone());
        ids.push(candidate);
    }

    return ids;
}

/// Build a result whose score is recomputed from its issues.
pub fn assemble(
    issues: Vec<Issue>,
    summary_bullets: Vec<String>,
    applied_rules: Option<String>,
) -> ReviewResult {
    let score_breakdown = score(&issues);
    return ReviewResult {
        applied_rules,
        issues,
        score: score_breakdown.final_score,
        score_breakdown,
        summary_bullets,
    };
}

/// Check every invariant a result must satisfy before it is reported.
///
/// # Errors
///
/// Returns `Error::SchemaValidation` naming the first violated invariant.
pub fn validate(result: &ReviewResult) -> Result<(), Error> {
    let breakdown = &result.score_breakdown;
    if breakdown.base != BASE_SCORE {
        return Err(Error::schema(format!("score_breakdown.base must be {BASE_SCORE}")));
    }
    if result.score != breakdown.final_score {
        return Err(Error::schema("score must equal score_breakdown.final"));
    }
    if *breakdown != score(&result.issues) {
        return Err(Error::schema("score_breakdown does not match the issues"));
    }

    let bullets = result.summary_bullets.len();
    if !(MIN_SUMMARY_BULLETS..=MAX_SUMMARY_BULLETS).contains(&bullets) {
        return Err(Error::schema(format!(
            "summary_bullets must contain {MIN_SUMMARY_BULLETS}-{MAX_SUMMARY_BULLETS} items, found {bullets}"
        )));
    }

    let mut ids = HashSet::new();
    for issue in &result.issues {
        if !ids.insert(issue.id.as_str()) {
            return Err(Error::schema(format!("duplicate issue id `{}`", issue.id)));
        }
    }

    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
#[allow(clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;

    fn issue(id: &str, severity: Severity) -> Issue {
        Issue {
            evidence: "line 1".to_string(),
            explanation: "Screen readers skip it.".to_string(),
            id: id.to_string(),
            severity,
            suggestion: "Add alt text.".to_string(),
            title: "Missing alt text".to_string(),
        }
    }

    #[test]
    fn no_issues_scores_full_marks() {
        let breakdown = score(&[]);
        assert_eq!(breakdown.base, 100);
        assert_eq!(breakdown.final_score, 100);
        assert!(breakdown.penalties.iter().all(|p| p.count == 0 && p.subtotal == 0));
        let severities: Vec<Severity> = breakdown.penalties.iter().map(|p| p.severity).collect();
        assert_eq!(severities, Severity::ORDERED.to_vec());
    }

    #[test]
    fn two_high_one_medium_scores_sixty_two() {
        let issues = vec![
            issue("A", Severity::High),
            issue("B", Severity::Medium),
            issue("C", Severity::High),
        ];
        let breakdown = score(&issues);
        assert_eq!(breakdown.final_score, 62);
        assert_eq!(breakdown.penalties[0].subtotal, 30);
        assert_eq!(breakdown.penalties[1].subtotal, 8);
        assert_eq!(breakdown.penalties[2].subtotal, 0);
    }

    #[test]
    fn penalties_and_final_sum_to_base_until_clamped() {
        for highs in 0..10 {
            let issues: Vec<Issue> = (0..highs).map(|n| issue(&n.to_string(), Severity::High)).collect();
            let breakdown = score(&issues);
            let sum: u32 = breakdown.penalties.iter().map(|p| p.subtotal).sum();
            if sum > 100 {
                assert_eq!(breakdown.final_score, 0);
            } else {
                assert_eq!(sum + breakdown.final_score, 100);
            }
        }
    }

    #[test]
    fn missing_ids_get_positional_numbers() {
        let ids = normalize_issue_ids(&[None, Some("  "), Some("ALT-1")]);
        assert_eq!(ids, vec!["ISSUE-1", "ISSUE-2", "ALT-1"]);
    }

    #[test]
    fn duplicate_ids_get_occurrence_suffix() {
        let ids = normalize_issue_ids(&[Some("X"), Some("X"), Some("X")]);
        assert_eq!(ids, vec!["X", "X-2", "X-3"]);
    }

    #[test]
    fn suffix_skips_ids_already_in_use() {
        let ids = normalize_issue_ids(&[Some("A"), Some("A-2"), Some("A")]);
        assert_eq!(ids, vec!["A", "A-2", "A-3"]);
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn normalization_is_idempotent_on_unique_ids() {
        let first = normalize_issue_ids(&[None, Some("B"), Some("B"), None]);
        let again: Vec<Option<&str>> = first.iter().map(|s| Some(s.as_str())).collect();
        assert_eq!(normalize_issue_ids(&again), first);
    }

    #[test]
    fn assembled_result_validates() {
        let result = assemble(
            vec![issue("A", Severity::Low)],
            vec!["one".into(), "two".into(), "three".into()],
            None,
        );
        assert_eq!(result.score, 97);
        assert!(validate(&result).is_ok());
    }

    #[test]
    fn tampered_score_fails_validation() {
        let mut result = assemble(Vec::new(), vec!["a".into(), "b".into(), "c".into()], None);
        result.score = 50;
        assert!(matches!(validate(&result), Err(Error::SchemaValidation { .. })));
    }

    #[test]
    fn too_few_bullets_fail_validation() {
        let result = assemble(Vec::new(), vec!["only".into()], None);
        assert!(validate(&result).is_err());
    }
}
