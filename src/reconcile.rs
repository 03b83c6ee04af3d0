//! Reconciliation of untrusted judge output into a validated `ReviewResult`.
//!
//! The judge is asked for JSON matching schema version 1. Whatever comes back
//! is repaired where the repair is unambiguous (ids, bullet count, score) and
//! rejected otherwise.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::scoring::{self, MAX_SUMMARY_BULLETS, MIN_SUMMARY_BULLETS};
use crate::types::{Issue, ReviewResult, Severity};

/// Version of the payload schema requested from the judge.
pub const SCHEMA_VERSION: u32 = 1;

/// Bullets used to pad a summary that came back too short.
const FILLER_BULLETS: [&str; 3] = [
    "Review completed with context-aware checks.",
    "Address high-severity issues first for greatest accessibility impact.",
    "Re-run review after edits to confirm score improvement.",
];

/// Parse raw judge text as a JSON object, tolerating a surrounding code fence.
/// Returns `None` when the text holds no JSON object.
pub fn parse_payload(raw: &str) -> Option<Map<String, Value>> {
    let cleaned = strip_code_fence(raw.trim());
    return match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) | Err(_) => None,
    };
}

/// Remove a leading ```` ``` ```` or ```` ```json ```` fence and its closing fence.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    return rest.trim();
}

/// Turn a judge payload into a validated result.
///
/// The payload's own `score` and `score_breakdown` are ignored and recomputed.
///
/// # Errors
///
/// Returns `Error::SchemaVersion` for an unexpected `schema_version`, or
/// `Error::SchemaValidation` when an issue or bullet cannot be repaired.
pub fn reconcile(payload: &Map<String, Value>) -> Result<ReviewResult, Error> {
    check_schema_version(payload)?;

    let issues = reconcile_issues(payload.get("issues"))?;
    let summary_bullets = reconcile_bullets(payload.get("summary_bullets"))?;
    let applied_rules = payload
        .get("applied_rules")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if let Some(proposed) = payload.get("score").and_then(Value::as_u64) {
        debug!(proposed, "discarding judge score");
    }

    let result = scoring::assemble(issues, summary_bullets, applied_rules);
    scoring::validate(&result)?;
    return Ok(result);
}

/// Reject payloads that declare a different schema version.
///
/// # Errors
///
/// Returns `Error::SchemaVersion` or `Error::SchemaValidation` for a non-integer version.
fn check_schema_version(payload: &Map<String, Value>) -> Result<(), Error> {
    let Some(raw) = payload.get("schema_version") else {
        return Ok(());
    };
    let Some(found) = raw.as_u64() else {
        return Err(Error::schema("schema_version must be an integer"));
    };
    if found != u64::from(SCHEMA_VERSION) {
        return Err(Error::SchemaVersion { expected: SCHEMA_VERSION, found });
    }
    return Ok(());
}

/// Validate issue fields and assign normalized ids. A non-list means no issues.
///
/// # Errors
///
/// Returns `Error::SchemaValidation` for a non-object issue, an unknown
/// severity, or an empty required field.
fn reconcile_issues(raw: Option<&Value>) -> Result<Vec<Issue>, Error> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut raw_ids: Vec<Option<String>> = Vec::with_capacity(items.len());
    let mut issues = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let position = idx.saturating_add(1);
        let Some(fields) = item.as_object() else {
            return Err(Error::schema(format!("issue {position} is not an object")));
        };

        let severity_text = fields.get("severity").and_then(Value::as_str).unwrap_or("");
        let Some(severity) = Severity::parse(severity_text) else {
            return Err(Error::schema(format!(
                "issue {position} has unknown severity `{severity_text}`"
            )));
        };

        raw_ids.push(id_text(fields.get("id")));
        issues.push(Issue {
            evidence: required_text(fields, "evidence", position)?,
            explanation: required_text(fields, "explanation", position)?,
            id: String::new(),
            severity,
            suggestion: required_text(fields, "suggestion", position)?,
            title: required_text(fields, "title", position)?,
        });
    }

    let borrowed: Vec<Option<&str>> = raw_ids.iter().map(Option::as_deref).collect();
    for (issue, id) in issues.iter_mut().zip(scoring::normalize_issue_ids(&borrowed)) {
        issue.id = id;
    }
    return Ok(issues);
}

/// An issue id given as a string or number.
fn id_text(raw: Option<&Value>) -> Option<String> {
    return match raw {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
}

/// A non-empty string field of an issue.
///
/// # Errors
///
/// Returns `Error::SchemaValidation` if the field is missing, not a string, or blank.
fn required_text(fields: &Map<String, Value>, key: &str, position: usize) -> Result<String, Error> {
    return fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::schema(format!("issue {position} is missing `{key}`")));
}

/// Pad or truncate the summary to 3..=6 bullets. A non-list means no bullets.
///
/// # Errors
///
/// Returns `Error::SchemaValidation` if a bullet is not a string.
fn reconcile_bullets(raw: Option<&Value>) -> Result<Vec<String>, Error> {
    let mut bullets = Vec::new();
    if let Some(items) = raw.and_then(Value::as_array) {
        for item in items {
            let Some(text) = item.as_str() else {
                return Err(Error::schema("summary_bullets must be strings"));
            };
            bullets.push(text.to_string());
        }
    }

    if bullets.len() < MIN_SUMMARY_BULLETS {
        bullets.extend(FILLER_BULLETS.iter().map(|b| (*b).to_string()));
        bullets.truncate(MIN_SUMMARY_BULLETS);
    }
    bullets.truncate(MAX_SUMMARY_BULLETS);
    return Ok(bullets);
}

/// Canned result for a document with no content; the judge is never called.
pub fn empty_document_result(rules_text: Option<&str>) -> ReviewResult {
    let applied_rules = rules_text.filter(|r| !r.trim().is_empty()).map(|_| {
        "Custom rules were provided but the document was empty, so no rule-based checks were applied."
            .to_string()
    });
    let bullets = vec![
        "The uploaded Markdown document is empty.".to_string(),
        "No accessibility issues were detected because there was no content to evaluate.".to_string(),
        "Add content and run the review again for a meaningful assessment.".to_string(),
    ];
    return scoring::assemble(Vec::new(), bullets, applied_rules);
}
